diesel::table! {
    companies (id) {
        id -> Uuid,
        name -> Varchar,
        user_id -> Uuid,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    inventory (id) {
        id -> Uuid,
        company_id -> Uuid,
        name -> Varchar,
        stock -> Int4,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    project_equipment (id) {
        id -> Uuid,
        company_id -> Uuid,
        project_id -> Uuid,
        item_id -> Uuid,
        check_in -> Date,
        check_out -> Date,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    projects (id) {
        id -> Uuid,
        company_id -> Uuid,
        name -> Varchar,
        date -> Date,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(inventory -> companies (company_id));
diesel::joinable!(project_equipment -> companies (company_id));
diesel::joinable!(project_equipment -> inventory (item_id));
diesel::joinable!(project_equipment -> projects (project_id));
diesel::joinable!(projects -> companies (company_id));

diesel::allow_tables_to_appear_in_same_query!(
    companies,
    inventory,
    project_equipment,
    projects,
);

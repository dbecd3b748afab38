registrar_core::labelled_enum! {
    /// Role of an account. Every account holds exactly one role.
    pub enum Role {
        Student => "student",
        Instructor => "instructor",
        Admin => "admin",
    }
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

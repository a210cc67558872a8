//! Well-known role name constants.
//!
//! These must match the CHECK constraint on `users.role` in
//! `20260301000002_create_users_table.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_KURIKULUM: &str = "kurikulum";
pub const ROLE_KEPALA_SEKOLAH: &str = "kepala_sekolah";
pub const ROLE_GURU: &str = "guru";
pub const ROLE_SISWA: &str = "siswa";

/// Roles whose holders may be scheduled to teach or cover a class.
pub const TEACHING_ROLES: &[&str] = &[ROLE_GURU, ROLE_KURIKULUM, ROLE_KEPALA_SEKOLAH, ROLE_ADMIN];

/// Roles allowed to confirm attendance and decide on leave requests.
pub const CURRICULUM_STAFF_ROLES: &[&str] = &[ROLE_KURIKULUM, ROLE_ADMIN];

/// Whether the role can stand in front of a class.
pub fn is_teaching_role(role: &str) -> bool {
    TEACHING_ROLES.contains(&role)
}

/// Whether the role may act on attendance confirmations and leave decisions.
pub fn is_curriculum_staff(role: &str) -> bool {
    CURRICULUM_STAFF_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn students_never_teach() {
        assert!(!is_teaching_role(ROLE_SISWA));
        assert!(is_teaching_role(ROLE_GURU));
        assert!(is_teaching_role(ROLE_KURIKULUM));
    }

    #[test]
    fn only_kurikulum_and_admin_are_staff() {
        assert!(is_curriculum_staff(ROLE_KURIKULUM));
        assert!(is_curriculum_staff(ROLE_ADMIN));
        assert!(!is_curriculum_staff(ROLE_GURU));
        assert!(!is_curriculum_staff(ROLE_KEPALA_SEKOLAH));
    }
}

pub mod attendance_repo;
pub mod audit_repo;
pub mod balance_repo;
pub mod holiday_repo;
pub mod leave_repo;
#[cfg(test)]
pub mod memory;
pub mod notification_repo;
pub mod repo_error;
pub mod user_repo;

/// Rows to skip for a 1-based page; huge pages saturate instead of wrapping.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.max(1).saturating_sub(1).saturating_mul(per_page)
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn offsets_saturate() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(u64::MAX, 100), u64::MAX);
    }
}

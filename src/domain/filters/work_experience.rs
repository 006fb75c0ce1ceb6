use super::{FilterField, FilterKind, FilterSet, SortDirection, SortKey};

pub static WORK_EXPERIENCE_FILTERS: FilterSet = FilterSet {
    table: "work_experience",
    fields: &[
        FilterField { name: "job_title", kind: FilterKind::Contains("job_title") },
        FilterField { name: "company_name", kind: FilterKind::Contains("company_name") },
    ],
    sorts: &[
        SortKey::Column("job_title"),
        SortKey::Column("company_name"),
        SortKey::Column("start_date"),
        SortKey::Column("end_date"),
        SortKey::Column("created_at"),
        SortKey::Column("updated_at"),
    ],
    default_sort: SortKey::Column("start_date"),
    default_direction: SortDirection::Desc,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{filtered_sql, FilterParams};

    #[test]
    fn newest_start_date_first_by_default() {
        let sql = filtered_sql(&WORK_EXPERIENCE_FILTERS, &FilterParams::default());

        assert!(sql.ends_with("ORDER BY work_experience.start_date DESC, work_experience.id ASC"));
    }

    #[test]
    fn sort_without_direction_uses_entity_default() {
        let params = FilterParams::default().with("sort", "company_name");
        let sql = filtered_sql(&WORK_EXPERIENCE_FILTERS, &params);

        assert!(sql.ends_with("ORDER BY work_experience.company_name DESC, work_experience.id ASC"));
    }

    #[test]
    fn both_text_filters_combine() {
        let params = FilterParams::default()
            .with("job_title", "engineer")
            .with("company_name", "acme");
        let sql = filtered_sql(&WORK_EXPERIENCE_FILTERS, &params);

        assert!(sql.contains("AND work_experience.job_title ILIKE $1 AND work_experience.company_name ILIKE $2"));
    }
}

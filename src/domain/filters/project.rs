use crate::entities::technology::TagPivot;

use super::{FilterField, FilterKind, FilterSet, SortDirection, SortKey};

pub static PROJECT_FILTERS: FilterSet = FilterSet {
    table: "projects",
    fields: &[
        FilterField { name: "name", kind: FilterKind::Contains("name") },
        FilterField { name: "short_description", kind: FilterKind::Contains("short_description") },
        FilterField { name: "link", kind: FilterKind::Contains("link") },
        FilterField { name: "github", kind: FilterKind::Contains("github") },
        FilterField { name: "technologies", kind: FilterKind::HasTechnology(TagPivot::Project) },
    ],
    sorts: &[
        SortKey::Column("name"),
        SortKey::Column("short_description"),
        SortKey::Column("link"),
        SortKey::Column("github"),
        SortKey::FirstTechnology { name: "technology", pivot: TagPivot::Project },
        SortKey::Column("created_at"),
        SortKey::Column("updated_at"),
    ],
    default_sort: SortKey::Column("name"),
    default_direction: SortDirection::Asc,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{filtered_sql, FilterParams};

    #[test]
    fn no_params_sorts_by_name() {
        let sql = filtered_sql(&PROJECT_FILTERS, &FilterParams::default());

        assert_eq!(sql, "SELECT * FROM projects WHERE TRUE ORDER BY projects.name ASC, projects.id ASC");
    }

    #[test]
    fn substring_and_technology_filters_are_applied() {
        let params = FilterParams::default()
            .with("name", "shop")
            .with("technologies", "1,2");
        let sql = filtered_sql(&PROJECT_FILTERS, &params);

        assert!(sql.contains("AND projects.name ILIKE $1"));
        assert!(sql.contains(
            "AND EXISTS (SELECT 1 FROM project_technology tf WHERE tf.project_id = projects.id AND tf.technology_id = ANY($2))"
        ));
    }

    #[test]
    fn unknown_params_leave_the_query_untouched() {
        let params = FilterParams::default()
            .with("colour", "blue")
            .with("page", "3")
            .with("direction", "desc");

        assert_eq!(
            filtered_sql(&PROJECT_FILTERS, &params),
            filtered_sql(&PROJECT_FILTERS, &FilterParams::default())
        );
    }

    #[test]
    fn unlisted_sort_falls_back_to_default() {
        let params = FilterParams::default().with("sort", "password").with("direction", "desc");
        let sql = filtered_sql(&PROJECT_FILTERS, &params);

        assert!(sql.ends_with("ORDER BY projects.name ASC, projects.id ASC"));
    }

    #[test]
    fn technology_sort_uses_first_linked_name() {
        let params = FilterParams::default().with("sort", "technology").with("direction", "desc");
        let sql = filtered_sql(&PROJECT_FILTERS, &params);

        assert!(sql.contains("ORDER BY (SELECT t.name FROM project_technology tp JOIN technologies t"));
        assert!(sql.contains("WHERE tp.project_id = projects.id ORDER BY tp.sort_order, t.id LIMIT 1) DESC NULLS LAST"));
    }

    #[test]
    fn non_numeric_technology_ids_are_dropped() {
        let params = FilterParams::default().with("technologies", "abc,");
        let sql = filtered_sql(&PROJECT_FILTERS, &params);

        assert!(!sql.contains("EXISTS"));
    }
}

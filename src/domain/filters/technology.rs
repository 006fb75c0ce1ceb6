use super::{FilterField, FilterKind, FilterSet, SortDirection, SortKey};

pub static TECHNOLOGY_FILTERS: FilterSet = FilterSet {
    table: "technologies",
    fields: &[
        FilterField { name: "name", kind: FilterKind::Contains("name") },
        FilterField { name: "slug", kind: FilterKind::Contains("slug") },
        FilterField { name: "category", kind: FilterKind::Equals("category") },
    ],
    sorts: &[
        SortKey::Column("name"),
        SortKey::Column("slug"),
        SortKey::Column("category"),
        SortKey::Column("created_at"),
        SortKey::Column("updated_at"),
    ],
    default_sort: SortKey::Column("name"),
    default_direction: SortDirection::Asc,
};

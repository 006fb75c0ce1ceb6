use tracing::info;
use validator::Validate;

use crate::{
    entities::{
        pagination::{PageRequest, Paginated},
        technology::{dedupe_ids, Technology, TechnologyCategory, TechnologyInput},
    },
    errors::AppError,
    filters::FilterParams,
    repositories::technology::TechnologyRepository,
};

/// Rejects the submission when any selected technology does not exist.
pub async fn check_technology_ids<T: TechnologyRepository>(repo: &T, ids: &[i64]) -> Result<(), AppError> {
    let wanted = dedupe_ids(ids);
    if wanted.is_empty() {
        return Ok(());
    }

    let found = repo.existing_ids(&wanted).await?;
    if found.len() == wanted.len() {
        return Ok(());
    }

    let missing: Vec<i64> = wanted.into_iter().filter(|id| !found.contains(id)).collect();
    Err(AppError::invalid_field(
        "technology_ids",
        format!("The selected technology ids are invalid: {:?}.", missing),
    ))
}

/// Field rules plus a slug that survives normalisation.
fn validate_input(input: &TechnologyInput) -> Result<String, AppError> {
    let slug = input.resolved_slug();
    let slug_check = if slug.is_empty() && !input.name.trim().is_empty() {
        Err(AppError::invalid_field("slug", "The slug must contain at least one letter or number."))
    } else {
        Ok(())
    };

    AppError::combine([input.validate().map_err(AppError::from), slug_check])?;
    Ok(slug)
}

pub struct TechnologyHandler<T>
where
    T: TechnologyRepository,
{
    pub technology_repo: T,
}

impl<T> TechnologyHandler<T>
where
    T: TechnologyRepository,
{
    pub fn new(technology_repo: T) -> Self {
        TechnologyHandler { technology_repo }
    }

    pub async fn index(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<Technology>, AppError> {
        self.technology_repo.search_technologies(params, page).await
    }

    /// Categories offered on the create and edit forms.
    pub fn categories(&self) -> [TechnologyCategory; 3] {
        TechnologyCategory::ALL
    }

    pub async fn get_technology(&self, id: i64) -> Result<Technology, AppError> {
        self.technology_repo.get_technology_by_id(id).await
    }

    pub async fn create(&self, input: &TechnologyInput) -> Result<Technology, AppError> {
        let slug = validate_input(input)?;

        let technology = self
            .technology_repo
            .create_technology(input.name.trim(), &slug, input.category)
            .await?;

        info!(technology_id = technology.id, slug = %technology.slug, "Technology created");
        Ok(technology)
    }

    pub async fn update(&self, id: i64, input: &TechnologyInput) -> Result<Technology, AppError> {
        let slug = validate_input(input)?;

        let technology = self
            .technology_repo
            .update_technology(id, input.name.trim(), &slug, input.category)
            .await?;

        info!(technology_id = id, "Technology updated");
        Ok(technology)
    }

    /// Pivot rows go with it by cascade.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.technology_repo.delete_technology(id).await?;
        info!(technology_id = id, "Technology deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::repositories::technology::MockTechnologyRepository as MockTechRepo;

    fn technology(id: i64, name: &str, slug: &str) -> Technology {
        let now = chrono::Utc::now();
        Technology {
            id,
            name: name.into(),
            slug: slug.into(),
            category: TechnologyCategory::Backend,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_rt::test]
    async fn unknown_technology_ids_are_reported() {
        let mut repo = MockTechRepo::new();
        repo.expect_existing_ids()
            .with(eq(vec![4_i64, 9]))
            .returning(|_| Ok(vec![4]));

        let err = check_technology_ids(&repo, &[4, 9, 4]).await.unwrap_err();

        assert_eq!(err.field_errors()[0].field, "technology_ids");
        assert!(err.field_errors()[0].message.contains("[9]"));
    }

    #[actix_rt::test]
    async fn empty_selection_skips_the_lookup() {
        let repo = MockTechRepo::new();
        assert!(check_technology_ids(&repo, &[]).await.is_ok());
    }

    #[actix_rt::test]
    async fn create_derives_slug_from_name() {
        let mut repo = MockTechRepo::new();
        repo.expect_create_technology()
            .withf(|name, slug, category| name == "Actix Web" && slug == "actix-web" && *category == TechnologyCategory::Backend)
            .returning(|name, slug, _| Ok(technology(1, name, slug)));

        let handler = TechnologyHandler::new(repo);
        let input = TechnologyInput {
            name: " Actix Web ".into(),
            slug: Some("  ".into()),
            category: TechnologyCategory::Backend,
        };

        let created = handler.create(&input).await.unwrap();
        assert_eq!(created.slug, "actix-web");
    }

    #[actix_rt::test]
    async fn invalid_input_never_reaches_the_repository() {
        let handler = TechnologyHandler::new(MockTechRepo::new());
        let input = TechnologyInput { name: String::new(), slug: None, category: TechnologyCategory::Tools };

        assert!(handler.create(&input).await.unwrap_err().is_validation());
    }

    #[actix_rt::test]
    async fn whitespace_name_is_rejected() {
        let handler = TechnologyHandler::new(MockTechRepo::new());
        let input = TechnologyInput { name: "   ".into(), slug: None, category: TechnologyCategory::Tools };

        let err = handler.create(&input).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field_errors()[0].field, "name");
    }

    #[actix_rt::test]
    async fn slug_without_letters_or_digits_is_rejected() {
        let handler = TechnologyHandler::new(MockTechRepo::new());
        let input = TechnologyInput { name: "!!!".into(), slug: None, category: TechnologyCategory::Tools };

        let err = handler.update(3, &input).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "slug");
    }
}

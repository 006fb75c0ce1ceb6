use tracing::info;

use crate::{
    entities::{
        pagination::{PageRequest, Paginated},
        work_experience::{WorkExperience, WorkExperienceData, WorkExperienceInput, WorkExperienceView},
    },
    errors::AppError,
    filters::FilterParams,
    repositories::work_experience::WorkExperienceRepository,
};

pub struct WorkExperienceHandler<W>
where
    W: WorkExperienceRepository,
{
    pub work_experience_repo: W,
}

impl<W> WorkExperienceHandler<W>
where
    W: WorkExperienceRepository,
{
    pub fn new(work_experience_repo: W) -> Self {
        WorkExperienceHandler { work_experience_repo }
    }

    pub async fn index(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<WorkExperienceView>, AppError> {
        let experiences = self.work_experience_repo.search_work_experiences(params, page).await?;
        Ok(experiences.map(WorkExperienceView::from))
    }

    pub async fn get_work_experience(&self, id: i64) -> Result<WorkExperienceView, AppError> {
        self.work_experience_repo
            .get_work_experience_by_id(id)
            .await
            .map(WorkExperienceView::from)
    }

    pub async fn create(&self, input: &WorkExperienceInput) -> Result<WorkExperience, AppError> {
        let data = WorkExperienceData::try_from(input)?;
        let experience = self.work_experience_repo.create_work_experience(&data).await?;

        info!(work_experience_id = experience.id, company = %experience.company_name, "Work experience created");
        Ok(experience)
    }

    pub async fn update(&self, id: i64, input: &WorkExperienceInput) -> Result<WorkExperience, AppError> {
        let data = WorkExperienceData::try_from(input)?;
        let experience = self.work_experience_repo.update_work_experience(id, &data).await?;

        info!(work_experience_id = id, "Work experience updated");
        Ok(experience)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.work_experience_repo.delete_work_experience(id).await?;
        info!(work_experience_id = id, "Work experience deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::work_experience::MockWorkExperienceRepository;

    #[actix_rt::test]
    async fn reversed_dates_are_rejected_before_persisting() {
        let handler = WorkExperienceHandler::new(MockWorkExperienceRepository::new());
        let input = WorkExperienceInput {
            job_title: "Engineer".into(),
            company_name: "Acme".into(),
            description: "Things.".into(),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2023-01-01".into()),
            ..Default::default()
        };

        let err = handler.create(&input).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "end_date");
    }

    #[actix_rt::test]
    async fn missing_record_surfaces_as_not_found() {
        let mut repo = MockWorkExperienceRepository::new();
        repo.expect_delete_work_experience()
            .returning(|id| Err(AppError::NotFound(format!("Work experience {} not found", id))));

        let handler = WorkExperienceHandler::new(repo);
        assert!(matches!(handler.delete(7).await, Err(AppError::NotFound(_))));
    }
}

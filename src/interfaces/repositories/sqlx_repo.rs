use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxFileRepo {
    pub pool: PgPool,
    pub public_url: String,
}

#[derive(Clone)]
pub struct SqlxTechnologyRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxProjectRepo {
    pub pool: PgPool,
    pub public_url: String,
}

#[derive(Clone)]
pub struct SqlxCertificationRepo {
    pub pool: PgPool,
    pub public_url: String,
}

#[derive(Clone)]
pub struct SqlxWorkExperienceRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxProfileRepo {
    pub pool: PgPool,
    pub public_url: String,
}

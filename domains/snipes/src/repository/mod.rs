//! Repository implementations for the Snipes domain

pub mod snipes;
pub mod users;

use sqlx::PgPool;

pub use snipes::SnipeRepository;
pub use users::UserRepository;

/// Combined repository access for the Snipes domain
#[derive(Clone)]
pub struct SnipesRepositories {
    pub users: UserRepository,
    pub snipes: SnipeRepository,
}

impl SnipesRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            snipes: SnipeRepository::new(pool),
        }
    }
}

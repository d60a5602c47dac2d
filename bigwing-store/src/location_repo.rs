use async_trait::async_trait;
use sqlx::PgPool;

use bigwing_core::catalog::Location;
use bigwing_core::query::{Ident, SelectQuery};
use bigwing_core::repository::LocationRepository;
use bigwing_core::{CoreError, CoreResult};
use bigwing_shared::{PageRequest, PaginatedResponse};

use crate::database::storage_error;
use crate::query::QueryComposer;

pub struct PgLocationRepository {
    composer: QueryComposer,
}

impl PgLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            composer: QueryComposer::new(pool),
        }
    }
}

pub(crate) fn location_query(search: Option<&str>) -> CoreResult<SelectQuery> {
    SelectQuery::new()
        .columns(&["id", "name", "code", "city", "country"])?
        .search("code", search.unwrap_or_default())?
        .order_by("name", true)
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn search_locations(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> CoreResult<PaginatedResponse<Location>> {
        let table = Ident::parse("locations")?;
        let query = location_query(search)?;

        self.composer
            .select_page(&table, query, page)
            .await
            .map_err(storage_error)?
            .try_map(|row| serde_json::from_value(row).map_err(CoreError::storage))
    }
}

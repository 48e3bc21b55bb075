//! Profile lookups for the signed-in operator.

use std::sync::Arc;

use domains::{AppError, Envelope, Profile, Query, RowStore};
use tracing::warn;

use crate::utils::map_row;

#[derive(Clone)]
pub struct ProfileService {
    rows: Arc<dyn RowStore>,
}

impl ProfileService {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    pub async fn get_profile(&self, user_id: &str) -> Envelope<Profile> {
        let query = Query::table("profiles").eq("id", user_id).range(0, 1);
        let result = async {
            let row = self.rows.select(&query).await?.into_iter().next();
            let row = row.ok_or_else(|| AppError::NotFound("Profile".into(), user_id.to_string()))?;
            map_row::<Profile>("profile", row)
        }
        .await;

        result.map_or_else(
            |e| {
                warn!(user_id, error = %e, "profile lookup failed");
                Envelope::fail(e.user_message())
            },
            Envelope::ok,
        )
    }
}

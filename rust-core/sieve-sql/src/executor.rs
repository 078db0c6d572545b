// SPDX-License-Identifier: PMPL-1.0-or-later
//! The seam between compiled plans and a database driver.

use async_trait::async_trait;
use tracing::debug;

use sieve_core::{Query, QueryError};

use crate::compiler::SqlBackend;
use crate::statement::Statement;

/// Runs a compiled statement and returns its rows.
///
/// Implementations render the statement with [`Statement::to_sql`] in the
/// placeholder style of their driver.
#[async_trait]
pub trait Executor: Send + Sync {
    type Row: Send;

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Self::Row>, QueryError>;
}

impl SqlBackend {
    /// Compile `query` onto `base` (default: `SELECT` of `entity`) and run it.
    pub async fn search<E>(
        &self,
        query: Option<&Query>,
        executor: &E,
        entity: &str,
        base: Option<Statement>,
    ) -> Result<Vec<E::Row>, QueryError>
    where
        E: Executor + ?Sized,
    {
        let base = match base {
            Some(statement) => statement,
            None => Statement::select(self.schema().lookup(entity)?),
        };
        let statement = self.apply(query, base, entity).await?;
        let rows = executor.fetch_all(&statement).await?;
        debug!(entity, rows = rows.len(), "query executed");
        Ok(rows)
    }
}

//! A thin wrapper around `rusqlite::Transaction`. All row-mutating operations
//! take a `&StoreTxn`; read-only `select`/`idmatch` helpers take `&Store`
//! directly and run outside any transaction.

pub struct StoreTxn<'a> {
    pub(super) inner: rusqlite::Transaction<'a>,
}

impl<'a> StoreTxn<'a> {
    pub fn commit(self) -> anyhow::Result<()> {
        self.inner.commit().map_err(|e| anyhow::anyhow!("commit failed: {e}"))
    }

    pub(super) fn conn(&self) -> &rusqlite::Connection {
        &self.inner
    }
}

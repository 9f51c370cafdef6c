//! MySQL connection setup.

use audit_core::{AuditError, Result};
use mysql_async::{prelude::*, Conn, OptsBuilder, Pool};
use tracing::{debug, info};

/// MySQL connection options.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema holding the source and audit tables
    pub database: String,
}

/// An open connection with its schema selected.
pub struct MySqlSession {
    pool: Pool,
    conn: Conn,
    database: String,
}

/// Connect to the server, then select the schema.
///
/// The two steps fail with distinct errors: [`AuditError::Connection`] when
/// the server cannot be reached or rejects the credentials, and
/// [`AuditError::Schema`] when the database cannot be selected.
pub async fn connect(opts: &ConnectOpts) -> Result<MySqlSession> {
    debug!(
        "Connecting to mysql. host = {}, port = {}, user = {}",
        opts.host, opts.port, opts.user
    );
    let builder = OptsBuilder::default()
        .ip_or_hostname(opts.host.clone())
        .tcp_port(opts.port)
        .user(Some(opts.user.clone()))
        .pass(Some(opts.password.clone()));
    let pool = Pool::new(builder);

    let mut conn = pool
        .get_conn()
        .await
        .map_err(|e| AuditError::Connection(e.to_string()))?;
    info!("Connected to mysql at {}:{}", opts.host, opts.port);

    conn.query_drop(format!("USE `{}`", opts.database.replace('`', "``")))
        .await
        .map_err(|e| AuditError::Schema {
            database: opts.database.clone(),
            reason: e.to_string(),
        })?;

    Ok(MySqlSession {
        pool,
        conn,
        database: opts.database.clone(),
    })
}

impl MySqlSession {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub(crate) fn conn(&mut self) -> &mut Conn {
        &mut self.conn
    }

    /// Base tables of the selected schema, by name.
    pub(crate) async fn list_tables(&mut self) -> Result<Vec<String>> {
        let sql = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES
                   WHERE TABLE_SCHEMA = ?
                   AND TABLE_TYPE = 'BASE TABLE'
                   ORDER BY TABLE_NAME";
        self.conn
            .exec(sql, (self.database.as_str(),))
            .await
            .map_err(|e| AuditError::query(sql, e))
    }

    /// Close the connection and the pool.
    pub async fn disconnect(self) -> Result<()> {
        let Self { pool, conn, .. } = self;
        drop(conn);
        pool.disconnect()
            .await
            .map_err(|e| AuditError::Connection(e.to_string()))
    }
}

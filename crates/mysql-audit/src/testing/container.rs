//! Docker container management for MySQL audit testing

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::client::ConnectOpts;

const ROOT_PASSWORD: &str = "testpass";
const DATABASE: &str = "testdb";

/// A throwaway MySQL 8 server holding the `testdb` schema.
///
/// The container is stopped and removed when this value is dropped.
pub struct MySqlAuditContainer {
    pub container_name: String,
    pub host_port: u16,
    pub image_name: String,
}

impl MySqlAuditContainer {
    pub fn new(container_name: &str, host_port: u16) -> Self {
        Self {
            container_name: container_name.to_string(),
            host_port,
            image_name: "mysql:8.0".to_string(),
        }
    }

    /// Options for connecting to the container as root.
    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            host: "127.0.0.1".to_string(),
            port: self.host_port,
            user: "root".to_string(),
            password: ROOT_PASSWORD.to_string(),
            database: DATABASE.to_string(),
        }
    }

    /// Starts the container, replacing any leftover one with the same name.
    pub fn start(&self) -> Result<()> {
        info!("Starting MySQL container: {}", self.container_name);
        self.remove_quietly();

        let output = Command::new("docker")
            .args([
                "run",
                "--name",
                &self.container_name,
                "-e",
                &format!("MYSQL_ROOT_PASSWORD={ROOT_PASSWORD}"),
                "-e",
                &format!("MYSQL_DATABASE={DATABASE}"),
                "-p",
                &format!("{}:3306", self.host_port),
                "-d",
                &self.image_name,
            ])
            .output()
            .context("Failed to start Docker container")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to start container: {stderr}");
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Started container: {container_id}");
        Ok(())
    }

    /// Polls until the server accepts connections and `testdb` exists.
    pub async fn wait_until_ready(&self, timeout_secs: u64) -> Result<()> {
        info!("Waiting for MySQL to be ready...");

        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);
        while start.elapsed() < timeout {
            match crate::connect(&self.connect_opts()).await {
                Ok(session) => {
                    session.disconnect().await?;
                    info!("MySQL is ready!");
                    return Ok(());
                }
                Err(e) => {
                    debug!("Connection attempt failed: {e}");
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                }
            }
        }

        anyhow::bail!("MySQL did not become ready within {timeout_secs} seconds")
    }

    /// Runs SQL through the `mysql` client inside the container.
    ///
    /// Goes through the command line client rather than the driver so that
    /// `DELIMITER` directives in generated scripts are honored.
    pub fn execute_sql(&self, sql: &str) -> Result<()> {
        let mut child = Command::new("docker")
            .args([
                "exec",
                "-i",
                &self.container_name,
                "mysql",
                "-uroot",
                &format!("-p{ROOT_PASSWORD}"),
                DATABASE,
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to run mysql client in container")?;

        child
            .stdin
            .take()
            .context("mysql client has no stdin")?
            .write_all(sql.as_bytes())
            .context("Failed to send SQL to mysql client")?;

        let output = child
            .wait_with_output()
            .context("Failed to wait for mysql client")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("mysql client failed: {stderr}");
        }
        Ok(())
    }

    /// Applies a generated `.audit.sql` script.
    pub fn apply_sql_file(&self, path: &Path) -> Result<()> {
        debug!("Applying {}", path.display());
        let sql = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.execute_sql(&sql)
    }

    pub fn stop(&self) -> Result<()> {
        info!("Stopping container: {}", self.container_name);

        for action in ["stop", "rm"] {
            let output = Command::new("docker")
                .args([action, &self.container_name])
                .output()
                .with_context(|| format!("Failed to {action} container"))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("docker {action} failed (may not exist): {stderr}");
            }
        }

        info!("Container stopped and removed");
        Ok(())
    }

    fn remove_quietly(&self) {
        for action in ["stop", "rm"] {
            let _ = Command::new("docker")
                .args([action, &self.container_name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

impl Drop for MySqlAuditContainer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

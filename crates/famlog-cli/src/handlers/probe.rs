//! Probe command handler.

use famlog_core::ModelSupervisorPort;

use crate::error::CliError;

/// Execute the probe command. Not ready maps to an `Unavailable` error.
pub async fn execute(supervisor: &dyn ModelSupervisorPort, port: u16) -> Result<(), CliError> {
    if supervisor.is_ready(port).await {
        println!("Port {port} is ready");
        Ok(())
    } else {
        Err(CliError::Unavailable(format!(
            "no ready model server on port {port}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::MockSupervisor;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn ready_port_succeeds() {
        let mut supervisor = MockSupervisor::new();
        supervisor
            .expect_is_ready()
            .with(eq(8080))
            .return_const(true);
        assert!(execute(&supervisor, 8080).await.is_ok());
    }

    #[tokio::test]
    async fn unready_port_is_unavailable() {
        let mut supervisor = MockSupervisor::new();
        supervisor.expect_is_ready().return_const(false);
        let err = execute(&supervisor, 8081).await.unwrap_err();
        assert!(matches!(err, CliError::Unavailable(_)));
    }
}

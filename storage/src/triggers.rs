//! Trigger Disabler.
//!
//! One `ALTER TABLE ... DISABLE TRIGGER ALL` per table, in the order given.
//! The first failure stops the loop; tables already altered stay altered.

use crate::connector::DatabaseHandle;
use errors::SqlError;
use utils::quote_qualified_ident;

pub fn disable_statement(table: &str) -> String {
    format!("ALTER TABLE {} DISABLE TRIGGER ALL", quote_qualified_ident(table))
}

pub fn enable_statement(table: &str) -> String {
    format!("ALTER TABLE {} ENABLE TRIGGER ALL", quote_qualified_ident(table))
}

pub async fn disable_all_triggers(
    handle: &mut DatabaseHandle,
    tables: &[String]
) -> Result<(), SqlError> {
    for table in tables {
        handle
            .execute(&disable_statement(table))
            .await
            .map_err(|e| match e {
                SqlError::Statement { reason, .. } => SqlError::TriggerDisable {
                    table: table.clone(),
                    reason
                },
                other => other
            })?;
        tracing::debug!(table = %table, "Disabled triggers");
    }

    tracing::info!(database = %handle.database(), tables = tables.len(), "Disabled all triggers");
    Ok(())
}

/// Inverse of [`disable_all_triggers`], for suites that want referential
/// integrity back once fixtures are loaded.
pub async fn enable_all_triggers(
    handle: &mut DatabaseHandle,
    tables: &[String]
) -> Result<(), SqlError> {
    for table in tables {
        handle
            .execute(&enable_statement(table))
            .await
            .map_err(|e| match e {
                SqlError::Statement { reason, .. } => SqlError::TriggerEnable {
                    table: table.clone(),
                    reason
                },
                other => other
            })?;
    }

    tracing::info!(database = %handle.database(), tables = tables.len(), "Enabled all triggers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_statement() {
        assert_eq!(disable_statement("users"), "ALTER TABLE \"users\" DISABLE TRIGGER ALL");
        assert_eq!(
            disable_statement("audit.events"),
            "ALTER TABLE \"audit\".\"events\" DISABLE TRIGGER ALL"
        );
    }

    #[test]
    fn test_disable_statement_keeps_dotted_table_name_whole() {
        assert_eq!(
            disable_statement("\"order.items\""),
            "ALTER TABLE \"order.items\" DISABLE TRIGGER ALL"
        );
    }

    #[tokio::test]
    async fn test_empty_table_list_issues_no_statements() {
        // A closed handle fails any statement, so success means none ran.
        let mut handle = DatabaseHandle::detached("app_0123456789abcdef");
        disable_all_triggers(&mut handle, &[]).await.unwrap();
        enable_all_triggers(&mut handle, &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_surfaces_connection_error_untouched() {
        let mut handle = DatabaseHandle::detached("app_0123456789abcdef");
        let err = disable_all_triggers(&mut handle, &["users".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlError::Connection(_)));
    }

    #[test]
    fn test_enable_statement() {
        assert_eq!(enable_statement("users"), "ALTER TABLE \"users\" ENABLE TRIGGER ALL");
    }
}

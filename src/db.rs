//! PostgreSQL access: connect with [`DbConfig`] and turn query results into a
//! [`Dataset`].

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use postgres::{Client, NoTls, Row};

use crate::config::DbConfig;
use crate::data::model::{Dataset, FieldValue, Observation};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Column types mapped to field values; anything else reads as `Null`.
const SUPPORTED_TYPES: &[&str] = &[
    "bool", "int2", "int4", "int8", "float4", "float8", "text", "varchar", "bpchar", "name",
];

/// Translate our config into the driver's connection parameters.
pub fn connection_params(config: &DbConfig) -> postgres::Config {
    let mut params = postgres::Config::new();
    params
        .host(&config.host)
        .port(config.port)
        .connect_timeout(CONNECT_TIMEOUT);
    if let Some(user) = &config.user {
        params.user(user);
    }
    if let Some(password) = &config.password {
        params.password(password);
    }
    if let Some(dbname) = &config.dbname {
        params.dbname(dbname);
    }
    params
}

/// Open a connection. Statements run in autocommit mode: nothing here opens a
/// transaction.
pub fn try_connect(config: &DbConfig) -> Result<Client> {
    connection_params(config)
        .connect(NoTls)
        .with_context(|| format!("connecting to {}:{}", config.host, config.port))
}

/// Like [`try_connect`] but logs the failure and yields `None`.
pub fn connect(config: &DbConfig) -> Option<Client> {
    match try_connect(config) {
        Ok(client) => {
            log::info!(
                "connected to database {:?} on {}:{}",
                config.dbname.as_deref().unwrap_or(""),
                config.host,
                config.port
            );
            Some(client)
        }
        Err(e) => {
            log::error!("Database connection failed: {e:#}");
            None
        }
    }
}

/// Run `sql` and collect every row as an [`Observation`].
pub fn query_dataset(client: &mut Client, sql: &str) -> Result<Dataset> {
    let statement = client.prepare(sql).context("preparing query")?;

    let columns: Vec<(String, String)> = statement
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.type_().name().to_string()))
        .collect();
    for (name, ty) in &columns {
        if !SUPPORTED_TYPES.contains(&ty.as_str()) {
            log::warn!("column '{name}' has type {ty}; values read as null (cast it in SQL)");
        }
    }

    let rows = client.query(&statement, &[]).context("executing query")?;
    let observations = rows
        .iter()
        .enumerate()
        .map(|(i, row)| row_to_observation(row, &columns).with_context(|| format!("row {i}")))
        .collect::<Result<Vec<_>>>()?;

    let names: Vec<String> = columns.into_iter().map(|(name, _)| name).collect();
    let dataset = Dataset::from_observations(observations, &names);
    log::info!("query returned {} records", dataset.len());
    Ok(dataset)
}

fn row_to_observation(row: &Row, columns: &[(String, String)]) -> Result<Observation> {
    let mut fields = BTreeMap::new();
    for (idx, (name, ty)) in columns.iter().enumerate() {
        let value = cell_value(row, idx, ty)
            .with_context(|| format!("reading column '{name}' ({ty})"))?;
        fields.insert(name.clone(), value);
    }
    Ok(Observation { fields })
}

fn cell_value(row: &Row, idx: usize, ty: &str) -> Result<FieldValue> {
    let value = match ty {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(FieldValue::Bool),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| FieldValue::Integer(v as i64)),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| FieldValue::Integer(v as i64)),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(FieldValue::Integer),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| FieldValue::Float(v as f64)),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(FieldValue::Float),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx)?.map(FieldValue::String)
        }
        _ => None,
    };
    Ok(value.unwrap_or(FieldValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_params_from_config() {
        let config = DbConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: Some("analyst".to_string()),
            password: Some("secret".to_string()),
            dbname: Some("streaming".to_string()),
        };
        let params = connection_params(&config);
        assert_eq!(params.get_ports(), &[6543]);
        assert_eq!(params.get_user(), Some("analyst"));
        assert_eq!(params.get_dbname(), Some("streaming"));
        assert_eq!(params.get_password(), Some(&b"secret"[..]));
        assert_eq!(params.get_connect_timeout(), Some(&CONNECT_TIMEOUT));
    }

    #[test]
    fn test_connect_failure_yields_none() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: Some("nobody".to_string()),
            password: None,
            dbname: Some("nothing".to_string()),
        };
        assert!(connect(&config).is_none());
        assert!(try_connect(&config).is_err());
    }
}

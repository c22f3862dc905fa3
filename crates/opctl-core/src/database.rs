//! Database connection settings written into the parameters document

use serde_yaml::Value;

use crate::params::Params;

/// Connection settings of the platform database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: String,
    pub database_name: String,
    pub driver_name: String,
}

impl DatabaseConfig {
    /// Read the `database.*.default` declarations of a vars document
    pub fn from_vars(vars: &Params) -> Self {
        let default = |field: &str| {
            vars.get(&format!("database.{}.default", field))
                .map(scalar_text)
                .unwrap_or_default()
        };

        Self {
            host: default("host"),
            username: default("username"),
            password: default("password"),
            port: default("port"),
            database_name: default("databaseName"),
            driver_name: default("driverName"),
        }
    }

    /// Write the settings under `database.*`; the port is kept as a quoted string
    pub fn apply_to(&self, params: &mut Params) {
        params.put("database.host", self.host.as_str());
        params.put("database.username", self.username.as_str());
        params.put("database.password", self.password.as_str());
        params.put("database.port", format!("\"{}\"", self.port));
        params.put("database.databaseName", self.database_name.as_str());
        params.put("database.driverName", self.driver_name.as_str());
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

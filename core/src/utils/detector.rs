use regex::Regex;

/// Database error strings that leak into rendered pages.
const DB_ERRORS: &[&str] = &[
    "SQL query error",
    "SQL syntax",
    "You have an error in your SQL syntax",
    "mysql_fetch",
    "mysql_num_rows",
    "Warning: mysql_",
    "MySqlException",
    "supplied argument is not a valid MySQL",
    "Warning: pg_",
    "PostgreSQL query failed",
    "PG::SyntaxError",
    "Unclosed quotation mark",
    "Microsoft OLE DB Provider",
    "ODBC SQL Server Driver",
    "SQLServer JDBC Driver",
    "System.Data.SqlClient.SqlException",
    "quoted string not properly terminated",
    "SQLite Error",
    "SQLite3::SQLException",
    "sqlite3.OperationalError",
    "Syntax error in query expression",
    "Dynamic SQL Error",
];

const DB_ERROR_PATTERNS: &[&str] = &[
    r"ORA-\d{5}",
    r"SQLSTATE\[\w+\]",
    r"DB2 SQL error:?\s*SQLCODE",
    r"Sybase message:",
];

/// Looks for database error signatures in a response body.
pub struct SignatureDetector {
    patterns: Vec<Regex>,
}

impl SignatureDetector {
    pub fn new() -> Self {
        let patterns = DB_ERROR_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self { patterns }
    }

    /// Returns the first signature found in `body`, if any.
    pub fn matched_signature(&self, body: &str) -> Option<String> {
        for error in DB_ERRORS {
            if body.contains(error) {
                return Some(error.to_string());
            }
        }
        self.patterns
            .iter()
            .find_map(|re| re.find(body))
            .map(|m| m.as_str().to_string())
    }

    pub fn is_vulnerable(&self, body: &str) -> bool {
        self.matched_signature(body).is_some()
    }
}

impl Default for SignatureDetector {
    fn default() -> Self {
        Self::new()
    }
}

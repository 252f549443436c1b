//! Parameterized SQL for the executor. Values are always bound through `?`
//! placeholders; only quoted identifiers are interpolated.

use homesearch_core::query::{Comparison, StructuredQuery};
use homesearch_core::schema;
use homesearch_core::types::Value;
use homesearch_store::quote_ident;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// `SELECT * FROM <table> [WHERE p1 AND p2 ...]` for every filter set on
/// `query`.
pub fn select_matching(table: &str, query: &StructuredQuery) -> Statement {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    for condition in query.conditions() {
        let column = quote_ident(condition.field.column());
        let symbol = match condition.operator {
            Comparison::Eq => "=",
            Comparison::Gte => ">=",
            Comparison::Gt => ">",
            Comparison::Lte => "<=",
            Comparison::Lt => "<",
            Comparison::Between => {
                if let Some(high) = condition.value_end {
                    clauses.push(format!("{column} BETWEEN ? AND ?"));
                    params.push(Value::Real(condition.value));
                    params.push(Value::Real(high));
                }
                continue;
            }
        };
        clauses.push(format!("{column} {symbol} ?"));
        params.push(Value::Real(condition.value));
    }

    if let Some(tier) = query.flood_risk() {
        clauses.push(format!("LOWER({}) LIKE ?", quote_ident(schema::FLOOD_RISK)));
        params.push(Value::Text(format!("%{}%", tier.as_str())));
    }
    if query.is_new_home() == Some(true) {
        clauses.push(format!("{} = ?", quote_ident(schema::IS_NEW_HOME)));
        params.push(Value::Integer(1));
    }
    if let Some(laua) = query.laua() {
        clauses.push(format!("LOWER({}) = ?", quote_ident(schema::LAUA)));
        params.push(Value::Text(laua.to_lowercase()));
    }
    if let Some(kind) = query.property_type() {
        let pattern = format!("%{}%", kind.to_lowercase());
        clauses.push(format!(
            "(LOWER({}) LIKE ? OR LOWER({}) LIKE ?)",
            quote_ident(schema::PROPERTY_TYPE_FULL_DESCRIPTION),
            quote_ident(schema::TYPE)
        ));
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }
    if let Some(address) = query.address() {
        clauses.push(format!("LOWER({}) LIKE ?", quote_ident(schema::ADDRESS)));
        params.push(Value::Text(format!("%{}%", address.to_lowercase())));
    }

    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    Statement { sql, params }
}

/// Area with the highest average crime score. Rows without an area or a
/// score are ignored.
pub fn area_with_most_crime(table: &str) -> Statement {
    let laua = quote_ident(schema::LAUA);
    let crime = quote_ident(schema::CRIME_SCORE);
    Statement {
        sql: format!(
            "SELECT {laua} AS area, AVG({crime}) AS avg_crime FROM {table} \
             WHERE {laua} IS NOT NULL AND {laua} <> '' AND {crime} IS NOT NULL \
             GROUP BY {laua} ORDER BY avg_crime DESC LIMIT 1",
            table = quote_ident(table),
        ),
        params: Vec::new(),
    }
}

/// Average price of listings described as studios.
pub fn studio_average_price(table: &str) -> Statement {
    Statement {
        sql: format!(
            "SELECT AVG({}) AS avg_price FROM {} WHERE LOWER({}) LIKE ?",
            quote_ident(schema::PRICE),
            quote_ident(table),
            quote_ident(schema::PROPERTY_TYPE_FULL_DESCRIPTION),
        ),
        params: vec![Value::Text("%studio%".to_string())],
    }
}

/// Average price of listings described as "2 bed" or with two bedrooms.
pub fn two_bed_average_price(table: &str) -> Statement {
    Statement {
        sql: format!(
            "SELECT AVG({}) AS avg_price FROM {} WHERE LOWER({}) LIKE ? OR {} = ?",
            quote_ident(schema::PRICE),
            quote_ident(table),
            quote_ident(schema::PROPERTY_TYPE_FULL_DESCRIPTION),
            quote_ident(schema::BEDROOMS),
        ),
        params: vec![Value::Text("%2 bed%".to_string()), Value::Integer(2)],
    }
}

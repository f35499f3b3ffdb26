#![doc = r#"
A typed Cypher client for Neo4j over REST or Bolt.

`graphwire` runs Cypher queries through one coordinator regardless of the
transport underneath: it checks each query against the transaction policy
of its category, runs it as an autocommit call or enlists it in the
caller's current transaction, maps the rows into Rust types, and reports
every completed call to the registered listeners.

# Quick start

## Map rows

```rust
use graphwire::prelude::*;

#[derive(Debug, GraphNode)]
#[graph(label = "User")]
struct User {
    id: i64,
    name: String,
}

#[derive(FromRow)]
struct UserRow {
    u: User,
    score: f64,
}
```

Scalars (`String`, integers, floats, `bool`, chrono types, `Option`, `Vec`,
`HashMap`, [`Json<T>`](graphwire_core::Json)) map straight from
single-column results.

## Connect and query

```rust,no_run
use graphwire::prelude::*;

# async fn example() -> Result<(), GraphError> {
let config = ClientConfig::builder()
    .address("bolt://localhost:7687")
    .user("neo4j")
    .password("secret")
    .build()?;
let client = GraphClient::connect_bolt(config).await?;

let ctx = CallContext::new();
let names: Vec<String> = client
    .execute_read(&ctx, CypherQuery::new("MATCH (u:User) RETURN u.name"))
    .await?;

let created = client
    .execute_query::<Record>(
        &ctx,
        CypherQuery::new("CREATE (:User {name: $name})").param("name", "Ann").write().with_stats(),
    )
    .await?;
# Ok(())
# }
```

The REST transport takes any [`HttpTransport`](transport::rest::HttpTransport):

```rust,ignore
let client = GraphClient::builder(config).rest(Arc::new(my_http)).build()?;
client.connect().await?;
```

## Transactions

The current transaction travels in the [`CallContext`] passed to each call.

```rust,no_run
use graphwire::prelude::*;

# async fn example(client: &GraphClient) -> Result<(), GraphError> {
let mut ctx = CallContext::new();
client.begin_transaction(&mut ctx, TransactionOptions::new()).await?;
client.execute(&ctx, CypherQuery::new("CREATE (:Tag {name: 'a'})")).await?;
client.execute(&ctx, CypherQuery::new("CREATE (:Tag {name: 'b'})")).await?;
client.end_transaction(&mut ctx).await?;
# Ok(())
# }
```

A nested `begin_transaction` joins the current transaction by default;
[`TransactionScopeOption::New`] opens an independent one and
[`TransactionScopeOption::Suppress`] runs without one. Statements that only
run in implicit transactions (`CALL { ... } IN TRANSACTIONS`,
`USING PERIODIC COMMIT`) are rejected inside a transaction.

# Error handling

Every operation returns [`GraphError`]. Row mapping errors carry the row
index and the struct, field, and property involved:

```text
row 3: UserRow::age: type mismatch: expected Integer, got String (i64)
```
"#]

pub mod capabilities;
pub mod client;
pub mod config;
pub mod deserializer;
pub mod events;
pub mod executor;
pub mod policy;
pub mod prelude;
pub mod query;
pub mod stats;
pub mod transaction;
pub mod transport;

pub use graphwire_core as core;
pub use graphwire_macros::{FromRow, GraphNode, GraphRelation, ToParams};

pub use client::{GraphClient, GraphClientBuilder};
pub use config::ClientConfig;
pub use executor::QueryOutput;
pub use graphwire_core::{GraphError, Record};
pub use query::CypherQuery;
pub use transaction::{CallContext, TransactionOptions, TransactionScopeOption};

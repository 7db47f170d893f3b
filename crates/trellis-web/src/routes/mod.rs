mod graphql;
mod health;

pub use graphql::{graphql_routes, GraphqlResponse};
pub use health::health_routes;

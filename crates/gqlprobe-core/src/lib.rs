pub mod compiler;
pub mod config;
pub mod crawler;
pub mod introspection;
pub mod schema;
pub mod synth;
pub mod transport;

mod de;

pub use compiler::{CompileError, RequestCompiler, RequestKind};
pub use config::{Config, ConfigError};
pub use crawler::{CrawlError, CrawlReport, CrawlState, Crawler, Operation, Outcome};
pub use introspection::{IntrospectionError, Introspector};
pub use schema::{Field, InputValue, Schema, SchemaIndex, Type, TypeKind};
pub use synth::{SynthesisError, Synthesizer, TimePolicy, Value};
pub use transport::{GraphQLRequest, GraphQLResponse, HttpTransport, Transport, TransportError};

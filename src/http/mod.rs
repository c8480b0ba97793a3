pub mod authutils;
pub mod charset;
pub mod digestauth;
pub mod multipart;
pub mod orderedheaders;
pub mod realm;
pub mod requestbody;
pub mod requestfactory;
pub mod response;

// Re-exports for convenience
pub use charset::Charset;
pub use orderedheaders::OrderedHeaderMap;
pub use realm::{AuthScheme, Realm, RealmBuilder};
pub use requestbody::{BodyGenerator, FileRegion, StreamSource, WireBody};
pub use requestfactory::{RequestFactory, WireRequest};
pub use response::{HttpResponse, ResponseBuilder};

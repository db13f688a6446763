// Gusset - low-level HTTP wire utilities
// This library provides the header, cookie, path, range, and MIME plumbing
// shared by connectors and handlers that speak HTTP on the wire.

pub mod acl;
pub mod buffer;
pub mod canonical;
pub mod cookie;
pub mod date;
pub mod encoding;
pub mod error;
pub mod etag;
pub mod header_map;
pub mod header_name;
pub mod header_token;
pub mod mime;
pub mod multipart;
pub mod path_matcher;
pub mod quality;
pub mod range;
pub mod status;
pub mod template;
pub mod url;

// Re-export commonly used types
pub use acl::*;
pub use buffer::*;
pub use canonical::*;
pub use cookie::*;
pub use date::*;
pub use encoding::*;
pub use error::*;
pub use etag::*;
pub use header_map::*;
pub use header_name::*;
pub use header_token::*;
pub use mime::*;
pub use multipart::*;
pub use path_matcher::*;
pub use quality::*;
pub use range::*;
pub use status::*;
pub use template::*;
pub use url::{decode_query_component, parse_query_string}; // decode/encode stay module-qualified

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ByteRange,
        Cookie,
        CookieParseOptions,
        ETag,
        ETagList,
        Error,
        HeaderMap,
        HeaderName,
        HeaderValues,
        MimeMappings,
        MultipartParser,
        PartVisitor,
        PathMatcher,
        PathParams,
        PathTemplate,
        PathTemplateMatcher,
        PeerAcl,
        QValue,
        Result,
        SameSite,
        StatusCode,
        parse_request_cookies,
        parse_set_cookie,
    };
}

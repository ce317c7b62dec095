//! Model of the legacy site's JSON export and the pure bookkeeping around
//! it: decoding, category tags, public routes and the redirect map.
mod categories;
mod decode;
mod export;
mod redirects;
mod routes;

pub use categories::{category_path, Category, Tag, TagRegistry};
pub use decode::{decode_export, parse_export, read_export, ExportError};
pub use export::{
    ArticleCatExport, ArticleExport, DeveloperExport, Export, FileCatExport, FileExport,
    GalleryCatExport, GalleryExport, GalleryPicFile, GameExport, NewsExport, SectionRefs,
    TopicExport,
};
pub use redirects::RedirectMap;
pub use routes::{legacy_path, post_route, section_route, SectionKind};

pub mod batch;
pub mod handlers;
pub mod scrape;
pub mod single;

pub use batch::BatchDownloader;
pub use scrape::ScrapeDownloader;
pub use single::SingleItemDownloader;

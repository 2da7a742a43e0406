// Job postings: CRUD plus the filterable/sortable/paginated listing.
// Every write fans out through the cache invalidator.

pub mod handlers;

// User profiles: current-user and public reads, upsert, and the profiles
// listing. Reads are cached under `api:` URL keys; the listing stays
// uncached because no invalidation rule covers it.

pub mod handlers;

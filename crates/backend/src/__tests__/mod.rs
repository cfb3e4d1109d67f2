mod fetch_flow;
mod incremental_sync;

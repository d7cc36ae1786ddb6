pub mod jsonl_search_index;
pub mod local_object_store;

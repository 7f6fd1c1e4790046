pub mod atlas_retriever;

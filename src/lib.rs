pub mod category;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod llm;
pub mod look;
pub mod prompt;
pub mod schema;
pub mod validator;
pub mod wardrobe;

pub mod rpc {
    pub mod outfitrunner {
        tonic::include_proto!("outfitrunner");
    }
}

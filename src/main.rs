use anyhow::Result;
use outfit_runner::codec::{MsgPackCodec, PayloadCodec};
use outfit_runner::config::RunnerConfig;
use outfit_runner::generator::OutfitGenerator;
use outfit_runner::llm::{LlmClient, OutfitModel, TimeoutModel};
use outfit_runner::look::{GenerationOptions, OutfitRequest, OutfitView};
use outfit_runner::rpc::outfitrunner::outfit_runner_server::{OutfitRunner, OutfitRunnerServer};
use outfit_runner::rpc::outfitrunner::{GenerateRequest, GenerateResponse};
use outfit_runner::wardrobe::WardrobeStats;
use tonic::{transport::Server, Request, Response, Status};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct OutfitRunnerService<C, M> {
    codec: C,
    generator: OutfitGenerator<M>,
    defaults: GenerationOptions,
}

#[tonic::async_trait]
impl<C, M> OutfitRunner for OutfitRunnerService<C, M>
where
    C: PayloadCodec + Send + Sync + 'static,
    M: OutfitModel + 'static,
{
    async fn generate(
        &self,
        request: Request<GenerateRequest>,
    ) -> Result<Response<GenerateResponse>, Status> {
        let inner = request.into_inner();

        let outfit_request: OutfitRequest = self
            .codec
            .decode(&inner.input)
            .map_err(|e| Status::invalid_argument(format!("decode input failed: {e}")))?;
        let (wardrobe, options) = outfit_request.into_parts(&self.defaults);

        let stats = WardrobeStats::of(&wardrobe);
        tracing::debug!(
            total = stats.total,
            unclassified = stats.unclassified,
            can_build_base = stats.can_build_base(),
            forced = options.forced_item_ids.len(),
            "Generating outfit"
        );

        // Only caller errors surface here; model failures end in the fallback.
        let generation = self
            .generator
            .generate(&wardrobe, &options)
            .await
            .map_err(|e| {
                tracing::info!(error = %e, "Rejected generation request");
                Status::invalid_argument(e.to_string())
            })?;

        let view = OutfitView::new(&generation, &options.forced_item_ids);
        tracing::info!(
            method = generation.method().as_str(),
            items = view.items.len(),
            "Outfit generated"
        );

        let output = self
            .codec
            .encode(&view)
            .map_err(|e| Status::internal(format!("encode output failed: {e}")))?;

        Ok(Response::new(GenerateResponse {
            output,
            ok: true,
            error: String::new(),
        }))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outfit_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env()?;
    tracing::info!(
        addr = %config.addr,
        llm = %config.llm_base_url,
        model = config.ollama_model.as_deref().unwrap_or("default"),
        max_attempts = config.max_attempts,
        "Loaded runner configuration"
    );

    let llm = LlmClient::new_with_model(config.llm_base_url.clone(), config.ollama_model.clone());
    let service = OutfitRunnerService {
        codec: MsgPackCodec,
        generator: OutfitGenerator::new(TimeoutModel::new(llm, config.model_timeout)),
        defaults: config.default_options(),
    };

    tracing::info!(addr = %config.addr, "OutfitRunner listening");
    Server::builder()
        .add_service(OutfitRunnerServer::new(service))
        .serve(config.addr)
        .await?;

    Ok(())
}

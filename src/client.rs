use std::time::Duration;

use anyhow::{anyhow, Result};
use tonic::transport::Channel;

use crate::codec::{MsgPackCodec, PayloadCodec};
use crate::look::{OutfitRequest, OutfitView};
use crate::rpc::outfitrunner::outfit_runner_client::OutfitRunnerClient;
use crate::rpc::outfitrunner::{GenerateRequest, GenerateResponse};

pub struct OutfitRunnerClientWrapper {
    client: OutfitRunnerClient<Channel>,
    codec: MsgPackCodec,
}

impl OutfitRunnerClientWrapper {
    pub async fn connect(addr: String) -> Result<Self> {
        let client = OutfitRunnerClient::connect(addr)
            .await
            .map_err(|e| anyhow!("Failed to connect to OutfitRunner server: {e}"))?;

        Ok(Self {
            client,
            codec: MsgPackCodec,
        })
    }

    pub async fn generate(&mut self, request: &OutfitRequest) -> Result<OutfitView> {
        let rpc_request = self.encode(request)?;

        let response = self
            .client
            .generate(rpc_request)
            .await
            .map_err(|e| anyhow!("gRPC call failed: {e}"))?;

        self.decode(response.into_inner())
    }

    /// Same as [`Self::generate`], abandoning the call after `timeout`.
    pub async fn generate_with_timeout(
        &mut self,
        request: &OutfitRequest,
        timeout: Duration,
    ) -> Result<OutfitView> {
        let rpc_request = self.encode(request)?;

        let response = tokio::time::timeout(timeout, self.client.generate(rpc_request))
            .await
            .map_err(|_| anyhow!("Request timed out after {:?}", timeout))?
            .map_err(|e| anyhow!("gRPC call failed: {e}"))?;

        self.decode(response.into_inner())
    }

    fn encode(&self, request: &OutfitRequest) -> Result<tonic::Request<GenerateRequest>> {
        let input = self
            .codec
            .encode(request)
            .map_err(|e| anyhow!("Failed to encode request: {e}"))?;

        Ok(tonic::Request::new(GenerateRequest { input }))
    }

    fn decode(&self, response: GenerateResponse) -> Result<OutfitView> {
        let GenerateResponse { output, ok, error } = response;

        if !ok {
            return Err(anyhow!("Outfit generation failed: {}", error));
        }

        self.codec
            .decode(&output)
            .map_err(|e| anyhow!("Failed to decode outfit: {e}"))
    }
}

// @generated
// Generated from: proto/metis/plugin/v1/plugin.proto
// Manual check-in for offline builds.

/// WES run request as forwarded to an engine plugin.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WesRequest {
    #[prost(string, tag = "1")]
    pub workflow_url: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub workflow_type: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub workflow_type_version: ::prost::alloc::string::String,
    #[prost(map = "string, message", tag = "4")]
    pub workflow_params:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost_types::Value>,
    #[prost(string, tag = "5")]
    pub workflow_engine: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub workflow_engine_version: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "7")]
    pub workflow_engine_parameters:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    #[prost(map = "string, string", tag = "8")]
    pub tags:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

/// Execution backend the translated spec will run against.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BackendConfig {
    #[prost(string, tag = "1")]
    pub backend_type: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "2")]
    pub tes_url: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "3")]
    pub tes_token: ::core::option::Option<::prost::alloc::string::String>,
}

/// Remote staging area for a run, with provider parameters.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StagingInfo {
    #[prost(string, tag = "1")]
    pub staging_url: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub endpoint_url: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "3")]
    pub parameters:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetExecutionSpecRequest {
    #[prost(message, optional, tag = "1")]
    pub wes_request: ::core::option::Option<WesRequest>,
    #[prost(message, optional, tag = "2")]
    pub staging_info: ::core::option::Option<StagingInfo>,
    #[prost(string, tag = "3")]
    pub primary_descriptor: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub backend_config: ::core::option::Option<BackendConfig>,
}

/// Fully resolved container execution of a workflow engine.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutionSpec {
    #[prost(string, tag = "1")]
    pub image: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub command: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(map = "string, string", tag = "3")]
    pub environment:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    /// Files to mount at absolute paths outside the shared volume
    #[prost(map = "string, string", tag = "4")]
    pub root_mount_files:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    /// Files to mount at paths relative to the shared volume
    #[prost(map = "string, string", tag = "5")]
    pub project_mount_files:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    /// Paths relative to the shared volume to stage after success
    #[prost(string, repeated, tag = "6")]
    pub outputs_to_stage: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum ParseState {
    UnknownState = 0,
    Success = 1,
    Failure = 2,
}

impl ParseState {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ParseState::UnknownState => "UNKNOWN_STATE",
            ParseState::Success => "SUCCESS",
            ParseState::Failure => "FAILURE",
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ParseExecutionRequest {
    #[prost(string, tag = "1")]
    pub job_logs: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub staging_info: ::core::option::Option<StagingInfo>,
    #[prost(enumeration = "ParseState", tag = "3")]
    pub state: i32,
}

/// Task-level log parsed from engine output.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WesTaskLog {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub cmd: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "3")]
    pub start_time: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub end_time: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub stdout: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub stderr: ::prost::alloc::string::String,
    #[prost(int32, tag = "7")]
    pub exit_code: i32,
    #[prost(string, repeated, tag = "8")]
    pub system_logs: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Canonical run log as parsed by an engine plugin.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WesRunLog {
    #[prost(message, optional, tag = "1")]
    pub run_log: ::core::option::Option<WesTaskLog>,
    #[prost(message, repeated, tag = "2")]
    pub task_logs: ::prost::alloc::vec::Vec<WesTaskLog>,
    #[prost(map = "string, message", tag = "3")]
    pub outputs:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost_types::Value>,
}

pub mod plugin_execution_client {
    #![allow(clippy::derive_partial_eq_without_eq)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct PluginExecutionClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl PluginExecutionClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> PluginExecutionClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn get_execution_spec(
            &mut self,
            request: impl tonic::IntoRequest<super::GetExecutionSpecRequest>,
        ) -> Result<tonic::Response<super::ExecutionSpec>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/metis.plugin.v1.PluginExecution/GetExecutionSpec",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn parse_execution(
            &mut self,
            request: impl tonic::IntoRequest<super::ParseExecutionRequest>,
        ) -> Result<tonic::Response<super::WesRunLog>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/metis.plugin.v1.PluginExecution/ParseExecution",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

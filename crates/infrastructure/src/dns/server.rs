use async_trait::async_trait;
use hickory_proto::op::{Header, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType as HickoryRecordType};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use sentinel_application::policy::PolicyEngine;
use sentinel_application::ports::{QueryLogRepository, ResponseCachePort, UpstreamResolver};
use sentinel_application::use_cases::decide_query::{decide_query, Answer};
use sentinel_domain::RecordType;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Per-client-query settings that don't vary per request but come from
/// the admin-configurable settings singleton (spec §4.1).
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub upstream_timeout: Duration,
    pub shadow_resolve_blocked: bool,
    pub synthesized_ttl: u32,
}

/// Binds the `RequestHandler` the DNS listener runs: wire parsing and
/// encoding only, the decision itself is `decide_query` (spec §4.1
/// "State machine per query").
pub struct DnsServerHandler {
    engine: Arc<PolicyEngine>,
    upstream: Arc<dyn UpstreamResolver>,
    cache: Arc<dyn ResponseCachePort>,
    log: Arc<dyn QueryLogRepository>,
    config: ListenerConfig,
}

impl DnsServerHandler {
    pub fn new(
        engine: Arc<PolicyEngine>,
        upstream: Arc<dyn UpstreamResolver>,
        cache: Arc<dyn ResponseCachePort>,
        log: Arc<dyn QueryLogRepository>,
        config: ListenerConfig,
    ) -> Self {
        Self { engine, upstream, cache, log, config }
    }

    async fn respond<R: ResponseHandler>(&self, request: &Request, mut response_handle: R) -> Result<ResponseInfo, std::io::Error> {
        let query = request.query();
        let query_name = query.name().to_string();
        let record_type = map_record_type(query.query_type());

        let client_ip = request.src().ip();
        let query_wire = request.raw_query().to_vec();

        let outcome = decide_query(
            &self.engine,
            self.upstream.as_ref(),
            self.cache.as_ref(),
            self.log.as_ref(),
            &query_wire,
            &query_name,
            record_type,
            &client_ip.to_string(),
            self.config.upstream_timeout,
            self.config.shadow_resolve_blocked,
            chrono::Utc::now(),
        )
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

        match outcome.answer {
            Answer::Forwarded(answer) => {
                // The upstream already speaks wire format for this query id;
                // relay its bytes back to the client verbatim.
                send_raw(&mut response_handle, request, &answer.wire_bytes).await
            }
            Answer::Cached { wire_bytes, .. } => send_raw(&mut response_handle, request, &wire_bytes).await,
            Answer::Blocked => {
                send_empty(&mut response_handle, request, ResponseCode::NXDomain).await
            }
            Answer::Synthesized(target) => {
                send_synthesized(&mut response_handle, request, &query_name, target, self.config.synthesized_ttl).await
            }
        }
    }
}

#[async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(&self, request: &Request, response_handle: R) -> ResponseInfo {
        match self.respond(request, response_handle.clone()).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "failed to answer DNS query");
                send_empty(&mut response_handle.clone(), request, ResponseCode::ServFail)
                    .await
                    .unwrap_or_else(|_| fallback_response_info(request))
            }
        }
    }
}

fn map_record_type(rt: HickoryRecordType) -> RecordType {
    match rt {
        HickoryRecordType::A => RecordType::A,
        HickoryRecordType::AAAA => RecordType::Aaaa,
        HickoryRecordType::CNAME => RecordType::Cname,
        HickoryRecordType::HTTPS => RecordType::Https,
        HickoryRecordType::TXT => RecordType::Txt,
        HickoryRecordType::SRV => RecordType::Srv,
        HickoryRecordType::MX => RecordType::Mx,
        HickoryRecordType::NS => RecordType::Ns,
        HickoryRecordType::PTR => RecordType::Ptr,
        other => RecordType::Other(u16::from(other)),
    }
}

async fn send_raw<R: ResponseHandler>(response_handle: &mut R, request: &Request, wire: &[u8]) -> Result<ResponseInfo, std::io::Error> {
    use hickory_proto::op::Message;
    use hickory_proto::serialize::binary::BinDecodable;

    let upstream_message = Message::from_bytes(wire).map_err(std::io::Error::other)?;
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(upstream_message.response_code());

    let answers = upstream_message.answers();
    let response = builder.build(header, answers.iter(), &[], &[], &[]);
    response_handle.send_response(response).await
}

async fn send_empty<R: ResponseHandler>(response_handle: &mut R, request: &Request, code: ResponseCode) -> Result<ResponseInfo, std::io::Error> {
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(code);
    header.set_message_type(MessageType::Response);
    header.set_op_code(OpCode::Query);
    let response = builder.build_no_records(header);
    response_handle.send_response(response).await
}

async fn send_synthesized<R: ResponseHandler>(
    response_handle: &mut R,
    request: &Request,
    query_name: &str,
    target: sentinel_domain::RewriteTarget,
    ttl: u32,
) -> Result<ResponseInfo, std::io::Error> {
    let name = Name::from_str(query_name).map_err(std::io::Error::other)?;

    let record = match target {
        sentinel_domain::RewriteTarget::V4(v4) => Record::from_rdata(name, ttl, RData::A(A(v4))),
        sentinel_domain::RewriteTarget::V6(v6) => Record::from_rdata(name, ttl, RData::AAAA(AAAA(v6))),
        sentinel_domain::RewriteTarget::Hostname(host) => {
            let target_name = Name::from_str(&host).map_err(std::io::Error::other)?;
            Record::from_rdata(name, ttl, RData::CNAME(CNAME(target_name)))
        }
    };

    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::NoError);
    let answers = vec![record];
    let response = builder.build(header, answers.iter(), &[], &[], &[]);
    response_handle.send_response(response).await
}

fn fallback_response_info(request: &Request) -> ResponseInfo {
    warn!("falling back to minimal SERVFAIL response info after send failure");
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::ServFail);
    header.into()
}

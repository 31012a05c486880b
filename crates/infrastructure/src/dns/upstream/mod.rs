pub mod doh;
pub mod dot;
pub mod tcp;
pub mod udp;

use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use std::net::IpAddr;

/// Shared wire-to-answer decode step for every transport (spec §4.1
/// "Answer synthesis" consumes `answer_ips`/`min_ttl`, the reply itself
/// forwards `wire_bytes` unmodified).
pub(crate) fn extract_answer(wire: &[u8]) -> (Vec<IpAddr>, Option<u32>) {
    let Ok(message) = Message::from_vec(wire) else {
        return (Vec::new(), None);
    };

    let mut ips = Vec::new();
    let mut min_ttl = None;
    for record in message.answers() {
        min_ttl = Some(min_ttl.map_or(record.ttl(), |t: u32| t.min(record.ttl())));
        match record.data() {
            RData::A(a) => ips.push(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => ips.push(IpAddr::V6(aaaa.0)),
            _ => {}
        }
    }
    (ips, min_ttl)
}

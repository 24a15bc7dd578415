//! Purpose: Cluster statistics and version records.
//! Exports: `LeaderStats`, `FollowerStats`, `SelfStats`, `LeaderInfo`, `StoreStats`, `Version`.
//! Role: Read-only response values for `/v2/stats/*` and `/version`.
//! Invariants: Fields the server omits decode to defaults; unknown fields are ignored.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LeaderStats {
    #[serde(default)]
    pub leader: String,
    #[serde(default)]
    pub followers: BTreeMap<String, FollowerStats>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FollowerStats {
    #[serde(default)]
    pub counts: FollowerCounts,
    #[serde(default)]
    pub latency: FollowerLatency,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FollowerCounts {
    #[serde(default)]
    pub fail: u64,
    #[serde(default)]
    pub success: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerLatency {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub maximum: f64,
    #[serde(default)]
    pub minimum: f64,
    #[serde(default)]
    pub standard_deviation: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfStats {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub leader_info: LeaderInfo,
    #[serde(default)]
    pub recv_append_request_cnt: u64,
    #[serde(default)]
    pub send_append_request_cnt: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv_pkg_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv_bandwidth_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_pkg_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_bandwidth_rate: Option<f64>,
}

impl SelfStats {
    pub fn is_leader(&self) -> bool {
        self.state == "StateLeader"
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderInfo {
    #[serde(default)]
    pub leader: String,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub start_time: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    #[serde(default)]
    pub gets_success: u64,
    #[serde(default)]
    pub gets_fail: u64,
    #[serde(default)]
    pub sets_success: u64,
    #[serde(default)]
    pub sets_fail: u64,
    #[serde(default)]
    pub delete_success: u64,
    #[serde(default)]
    pub delete_fail: u64,
    #[serde(default)]
    pub update_success: u64,
    #[serde(default)]
    pub update_fail: u64,
    #[serde(default)]
    pub create_success: u64,
    #[serde(default)]
    pub create_fail: u64,
    #[serde(default)]
    pub compare_and_swap_success: u64,
    #[serde(default)]
    pub compare_and_swap_fail: u64,
    #[serde(default)]
    pub compare_and_delete_success: u64,
    #[serde(default)]
    pub compare_and_delete_fail: u64,
    #[serde(default)]
    pub expire_count: u64,
    #[serde(default)]
    pub watchers: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Version {
    #[serde(default)]
    pub etcdserver: String,
    #[serde(default)]
    pub etcdcluster: String,
}

#[cfg(test)]
mod tests {
    use super::{LeaderStats, SelfStats, StoreStats};

    #[test]
    fn leader_stats_key_followers_by_id() {
        let body = r#"{
            "leader": "924e2e83e93f2560",
            "followers": {
                "6e3bd23ae5f1eae0": {
                    "counts": {"fail": 0, "success": 745},
                    "latency": {"average": 0.017039507382550306, "current": 0.000138, "maximum": 1.007649, "minimum": 0, "standardDeviation": 0.05289178277920594}
                }
            }
        }"#;
        let stats: LeaderStats = serde_json::from_str(body).expect("stats");
        let follower = stats.followers.get("6e3bd23ae5f1eae0").expect("follower");
        assert_eq!(follower.counts.success, 745);
        assert!(follower.latency.maximum > 1.0);
    }

    #[test]
    fn self_stats_tolerate_missing_rates() {
        let body = r#"{"name":"node3","id":"eca0338f4ea31566","state":"StateFollower","startTime":"2015-08-12T13:46:35.823Z","leaderInfo":{"leader":"924e2e83e93f2560","uptime":"10m59.322358947s","startTime":"2015-08-12T13:47:34.436Z"},"recvAppendRequestCnt":2453,"sendAppendRequestCnt":0,"recvPkgRate":5.4}"#;
        let stats: SelfStats = serde_json::from_str(body).expect("stats");
        assert!(!stats.is_leader());
        assert_eq!(stats.leader_info.leader, "924e2e83e93f2560");
        assert_eq!(stats.recv_pkg_rate, Some(5.4));
        assert!(stats.send_pkg_rate.is_none());
    }

    #[test]
    fn store_stats_decode_camel_case() {
        let body = r#"{"compareAndSwapFail":1,"compareAndSwapSuccess":2,"getsSuccess":9,"watchers":3}"#;
        let stats: StoreStats = serde_json::from_str(body).expect("stats");
        assert_eq!(stats.compare_and_swap_fail, 1);
        assert_eq!(stats.gets_success, 9);
        assert_eq!(stats.watchers, 3);
        assert_eq!(stats.sets_fail, 0);
    }
}

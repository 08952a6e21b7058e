//! AWS partition lookups keyed by region

/// Public DNS suffix of service endpoints in the region's partition
pub fn dns_suffix(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    }
}

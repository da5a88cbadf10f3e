//! 格式化工具

/// Socket 地址格式化包装器
///
/// 将 `SocketAddr` 格式化为规范的 IP 地址和端口格式
///
/// # 示例
///
/// ```
/// use prometheus_demo::util::format::SocketAddrFormat;
/// use std::net::SocketAddr;
///
/// let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
/// assert_eq!(format!("{}", SocketAddrFormat(&addr)), "127.0.0.1 8080");
/// ```
pub struct SocketAddrFormat<'a>(pub &'a std::net::SocketAddr);

impl std::fmt::Display for SocketAddrFormat<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0.ip().to_canonical(), self.0.port())
    }
}

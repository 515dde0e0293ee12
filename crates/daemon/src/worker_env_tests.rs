use super::*;

#[test]
fn fresh_job_env_has_no_restart_keys() {
    let env = build("10.0.0.1", 7000, 4, Duration::from_secs(5), None);
    assert_eq!(env.get("RDC_TRACKER_URI").unwrap(), "10.0.0.1");
    assert_eq!(env.get("RDC_TRACKER_PORT").unwrap(), "7000");
    assert_eq!(env.get("RDC_NUM_WORKERS").unwrap(), "4");
    assert_eq!(env.get("RDC_HEARTBEAT_INTERVAL").unwrap(), "5000");
    assert_eq!(env.get("RDC_SHMEM_SIZE").unwrap(), "1024");
    assert_eq!(env.get("RDC_RDMA_BUFSIZE").unwrap(), "33554432");
    assert_eq!(env.get("RDC_BACKEND").unwrap(), "TCP");
    assert!(!env.contains_key("RDC_RESTART"));
    assert!(!env.contains_key("RDC_PENDING_NODES"));
}

#[test]
fn restart_job_env_carries_restart_keys() {
    let env = build("10.0.0.1", 7000, 3, Duration::from_secs(5), Some(1));
    assert_eq!(env.get("RDC_RESTART").unwrap(), "1");
    assert_eq!(env.get("RDC_PENDING_NODES").unwrap(), "1");
}

mod common;

use redis::aio::MultiplexedConnection;
use redis::{RedisResult, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use common::TestServer;

async fn connect() -> (TestServer, MultiplexedConnection, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path().join("appendonly.aof")).await;
    let connection = server.connect().await;

    (server, connection, dir)
}

async fn query<T: redis::FromRedisValue>(
    connection: &mut MultiplexedConnection,
    args: &[&str],
) -> RedisResult<T> {
    let mut cmd = redis::cmd(args[0]);
    for arg in &args[1..] {
        cmd.arg(*arg);
    }
    cmd.query_async(connection).await
}

#[tokio::test]
async fn test_ping() {
    let (_server, mut con, _dir) = connect().await;

    let pong: String = query(&mut con, &["PING"]).await.unwrap();
    let echo: String = query(&mut con, &["PING", "hello"]).await.unwrap();

    assert_eq!(pong, "PONG");
    assert_eq!(echo, "hello");
}

#[tokio::test]
async fn test_set_get_and_expire() {
    let (_server, mut con, _dir) = connect().await;

    let ok: String = query(&mut con, &["SET", "foo", "bar"]).await.unwrap();
    let value: String = query(&mut con, &["GET", "foo"]).await.unwrap();
    assert_eq!(ok, "OK");
    assert_eq!(value, "bar");

    let expired: i64 = query(&mut con, &["EXPIRE", "foo", "0"]).await.unwrap();
    let value: Option<String> = query(&mut con, &["GET", "foo"]).await.unwrap();
    let exists: i64 = query(&mut con, &["EXISTS", "foo"]).await.unwrap();

    assert_eq!(expired, 1);
    assert_eq!(value, None);
    assert_eq!(exists, 0);
}

#[tokio::test]
async fn test_ttl_and_persist() {
    let (_server, mut con, _dir) = connect().await;

    let _: String = query(&mut con, &["SET", "foo", "bar"]).await.unwrap();
    let no_ttl: i64 = query(&mut con, &["TTL", "foo"]).await.unwrap();
    let _: i64 = query(&mut con, &["EXPIRE", "foo", "100"]).await.unwrap();
    let ttl: i64 = query(&mut con, &["TTL", "foo"]).await.unwrap();
    let persisted: i64 = query(&mut con, &["PERSIST", "foo"]).await.unwrap();
    let after: i64 = query(&mut con, &["TTL", "foo"]).await.unwrap();
    let missing: i64 = query(&mut con, &["TTL", "nope"]).await.unwrap();

    assert_eq!(no_ttl, -1);
    assert!((99..=100).contains(&ttl));
    assert_eq!(persisted, 1);
    assert_eq!(after, -1);
    assert_eq!(missing, -2);
}

#[tokio::test]
async fn test_set_clears_ttl() {
    let (_server, mut con, _dir) = connect().await;

    let _: String = query(&mut con, &["SET", "foo", "bar"]).await.unwrap();
    let _: i64 = query(&mut con, &["EXPIRE", "foo", "100"]).await.unwrap();
    let _: String = query(&mut con, &["SET", "foo", "baz"]).await.unwrap();
    let ttl: i64 = query(&mut con, &["TTL", "foo"]).await.unwrap();

    assert_eq!(ttl, -1);
}

#[tokio::test]
async fn test_multi_key_commands() {
    let (_server, mut con, _dir) = connect().await;

    let _: String = query(&mut con, &["MSET", "a", "1", "b", "2"]).await.unwrap();
    let values: Vec<Option<String>> = query(&mut con, &["MGET", "a", "nope", "b"]).await.unwrap();
    let rejected: i64 = query(&mut con, &["MSETNX", "b", "3", "c", "4"]).await.unwrap();
    let accepted: i64 = query(&mut con, &["MSETNX", "c", "3", "d", "4"]).await.unwrap();
    let exists: i64 = query(&mut con, &["EXISTS", "a", "b", "nope"]).await.unwrap();
    let deleted: i64 = query(&mut con, &["DEL", "a", "b", "nope"]).await.unwrap();
    let mut keys: Vec<String> = query(&mut con, &["KEYS", "*"]).await.unwrap();
    keys.sort();

    assert_eq!(
        values,
        vec![Some("1".to_string()), None, Some("2".to_string())]
    );
    assert_eq!(rejected, 0);
    assert_eq!(accepted, 1);
    assert_eq!(exists, 2);
    assert_eq!(deleted, 2);
    assert_eq!(keys, vec!["c", "d"]);
}

#[tokio::test]
async fn test_keys_glob() {
    let (_server, mut con, _dir) = connect().await;

    let _: String = query(&mut con, &["MSET", "user:1", "a", "user:2", "b", "order:1", "c"])
        .await
        .unwrap();
    let mut keys: Vec<String> = query(&mut con, &["KEYS", "user:*"]).await.unwrap();
    keys.sort();

    assert_eq!(keys, vec!["user:1", "user:2"]);
}

#[tokio::test]
async fn test_lists() {
    let (_server, mut con, _dir) = connect().await;

    let len: i64 = query(&mut con, &["RPUSH", "l", "a", "b", "c"]).await.unwrap();
    let range: Vec<String> = query(&mut con, &["LRANGE", "l", "0", "-1"]).await.unwrap();
    let popped: Vec<String> = query(&mut con, &["LPOP", "l", "2"]).await.unwrap();
    let left: i64 = query(&mut con, &["LLEN", "l"]).await.unwrap();

    assert_eq!(len, 3);
    assert_eq!(range, vec!["a", "b", "c"]);
    assert_eq!(popped, vec!["a", "b"]);
    assert_eq!(left, 1);
}

#[tokio::test]
async fn test_list_editing() {
    let (_server, mut con, _dir) = connect().await;

    let _: i64 = query(&mut con, &["RPUSH", "l", "a", "x", "b", "x", "c"]).await.unwrap();
    let removed: i64 = query(&mut con, &["LREM", "l", "0", "x"]).await.unwrap();
    let inserted: i64 = query(&mut con, &["LINSERT", "l", "BEFORE", "b", "z"]).await.unwrap();
    let no_pivot: i64 = query(&mut con, &["LINSERT", "l", "AFTER", "nope", "z"]).await.unwrap();
    let _: String = query(&mut con, &["LSET", "l", "0", "A"]).await.unwrap();
    let out_of_range: RedisResult<String> = query(&mut con, &["LSET", "l", "10", "A"]).await;
    let index: Option<String> = query(&mut con, &["LINDEX", "l", "-1"]).await.unwrap();
    let missing_index: Option<String> = query(&mut con, &["LINDEX", "l", "10"]).await.unwrap();
    let _: String = query(&mut con, &["LTRIM", "l", "1", "2"]).await.unwrap();
    let range: Vec<String> = query(&mut con, &["LRANGE", "l", "0", "-1"]).await.unwrap();
    let tail: String = query(&mut con, &["RPOP", "l"]).await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(inserted, 4);
    assert_eq!(no_pivot, -1);
    assert!(out_of_range.unwrap_err().to_string().contains("index out of range"));
    assert_eq!(index.as_deref(), Some("c"));
    assert_eq!(missing_index, None);
    assert_eq!(range, vec!["z", "b"]);
    assert_eq!(tail, "b");
}

#[tokio::test]
async fn test_emptied_list_is_removed() {
    let (_server, mut con, _dir) = connect().await;

    let _: i64 = query(&mut con, &["RPUSH", "l", "a"]).await.unwrap();
    let _: String = query(&mut con, &["LPOP", "l"]).await.unwrap();
    let exists: i64 = query(&mut con, &["EXISTS", "l"]).await.unwrap();
    let popped: Option<String> = query(&mut con, &["RPOP", "l"]).await.unwrap();

    assert_eq!(exists, 0);
    assert_eq!(popped, None);
}

#[tokio::test]
async fn test_sorted_sets() {
    let (_server, mut con, _dir) = connect().await;

    let added: i64 = query(&mut con, &["ZADD", "z", "1", "a", "2", "b", "3", "c"]).await.unwrap();
    let range: Vec<String> = query(&mut con, &["ZRANGE", "z", "0", "-1", "WITHSCORES"])
        .await
        .unwrap();
    let rank: i64 = query(&mut con, &["ZRANK", "z", "b"]).await.unwrap();
    let rev_rank: i64 = query(&mut con, &["ZREVRANK", "z", "a"]).await.unwrap();
    let missing: Option<i64> = query(&mut con, &["ZRANK", "z", "nope"]).await.unwrap();
    let rev: Vec<String> = query(&mut con, &["ZREVRANGE", "z", "0", "1"]).await.unwrap();

    assert_eq!(added, 3);
    assert_eq!(range, vec!["a", "1", "b", "2", "c", "3"]);
    assert_eq!(rank, 1);
    assert_eq!(rev_rank, 2);
    assert_eq!(missing, None);
    assert_eq!(rev, vec!["c", "b"]);
}

#[tokio::test]
async fn test_sorted_set_score_ranges() {
    let (_server, mut con, _dir) = connect().await;

    let _: i64 = query(&mut con, &["ZADD", "z", "1", "a", "2", "b", "3", "c", "4", "d"])
        .await
        .unwrap();
    let updated: i64 = query(&mut con, &["ZADD", "z", "1.5", "a"]).await.unwrap();
    let by_score: Vec<String> = query(&mut con, &["ZRANGEBYSCORE", "z", "(1.5", "+inf"])
        .await
        .unwrap();
    let limited: Vec<String> = query(
        &mut con,
        &["ZRANGEBYSCORE", "z", "-inf", "+inf", "LIMIT", "1", "2", "WITHSCORES"],
    )
    .await
    .unwrap();
    let reversed: Vec<String> = query(&mut con, &["ZREVRANGEBYSCORE", "z", "3", "2"])
        .await
        .unwrap();
    let count: i64 = query(&mut con, &["ZCOUNT", "z", "2", "(4"]).await.unwrap();
    let removed: i64 = query(&mut con, &["ZREM", "z", "a", "nope"]).await.unwrap();
    let card: i64 = query(&mut con, &["ZCARD", "z"]).await.unwrap();

    assert_eq!(updated, 0);
    assert_eq!(by_score, vec!["b", "c", "d"]);
    assert_eq!(limited, vec!["b", "2", "c", "3"]);
    assert_eq!(reversed, vec!["c", "b"]);
    assert_eq!(count, 2);
    assert_eq!(removed, 1);
    assert_eq!(card, 3);
}

#[tokio::test]
async fn test_errors() {
    let (_server, mut con, _dir) = connect().await;

    let _: String = query(&mut con, &["SET", "s", "v"]).await.unwrap();

    let wrong_type: RedisResult<i64> = query(&mut con, &["LPUSH", "s", "a"]).await;
    let unknown: RedisResult<Value> = query(&mut con, &["FLY", "away"]).await;
    let arity: RedisResult<Value> = query(&mut con, &["GET"]).await;
    let not_integer: RedisResult<Value> = query(&mut con, &["EXPIRE", "s", "soon"]).await;
    let nan: RedisResult<Value> = query(&mut con, &["ZADD", "z", "nan", "a"]).await;

    assert!(wrong_type.unwrap_err().to_string().contains("WRONGTYPE"));
    assert!(unknown.unwrap_err().to_string().contains("unknown command"));
    assert!(arity.is_err());
    assert!(not_integer.is_err());
    assert!(nan.is_err());

    // The connection is still usable afterwards.
    let value: String = query(&mut con, &["GET", "s"]).await.unwrap();
    assert_eq!(value, "v");
}

#[tokio::test]
async fn test_raw_protocol() {
    let (server, _con, _dir) = connect().await;
    let mut stream = TcpStream::connect(server.address).await.unwrap();

    stream
        .write_all(b"PING\r\n*x\r\n*1\r\n$4\r\nPING\r\n")
        .await
        .unwrap();

    let expected = b"+PONG\r\n-ERR Protocol error: invalid multibulk length\r\n+PONG\r\n";
    let mut reply = vec![0; expected.len()];
    stream.read_exact(&mut reply).await.unwrap();

    assert_eq!(&reply[..], &expected[..]);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let (server, mut con, _dir) = connect().await;

    let mut tasks = vec![];
    for i in 0..8 {
        let mut con = server.connect().await;
        tasks.push(tokio::spawn(async move {
            for j in 0..50 {
                let member = format!("{}-{}", i, j);
                let _: i64 = query(&mut con, &["RPUSH", "l", member.as_str()]).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let len: i64 = query(&mut con, &["LLEN", "l"]).await.unwrap();
    assert_eq!(len, 400);
}

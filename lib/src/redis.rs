use redis::{aio::ConnectionManager, Client, RedisResult};

/// Shared redis handle backed by a reconnecting [`ConnectionManager`].
#[derive(Clone)]
pub struct RedisConnection(ConnectionManager);

impl RedisConnection {
    pub async fn new(url: &str) -> RedisResult<Self> {
        Ok(Self(ConnectionManager::new(Client::open(url)?).await?))
    }
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection").finish()
    }
}

impl redis::aio::ConnectionLike for RedisConnection {
    fn req_packed_command<'a>(
        &'a mut self,
        cmd: &'a redis::Cmd,
    ) -> redis::RedisFuture<'a, redis::Value> {
        self.0.req_packed_command(cmd)
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a redis::Pipeline,
        offset: usize,
        count: usize,
    ) -> redis::RedisFuture<'a, Vec<redis::Value>> {
        self.0.req_packed_commands(cmd, offset, count)
    }

    fn get_db(&self) -> i64 {
        self.0.get_db()
    }
}

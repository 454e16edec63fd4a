use crate::constants::database::POOL_ACQUIRE_TIMEOUT;
use crate::error::{PersistError, Result};
use crate::introspect::QueryRunner;
use crate::value::{self, NativeParam, NativeType, PersistValue};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo};
use tracing::{debug, info};

/// 基于 sqlx 连接池的查询执行器
#[derive(Debug, Clone)]
pub struct MySqlRunner {
    pool: MySqlPool,
}

impl MySqlRunner {
    /// 连接数据库
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!("连接 MySQL 数据库 (最大连接数: {})", max_connections);
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryRunner for MySqlRunner {
    async fn run_query(
        &self,
        sql: &str,
        params: &[PersistValue],
    ) -> Result<Vec<Vec<PersistValue>>> {
        debug!("执行查询: {} 参数: {:?}", sql.trim(), params);
        let query = bind_params(sqlx::query(sql), params)?;
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        debug!("执行语句: {}", sql);
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[PersistValue],
) -> Result<Query<'q, MySql, MySqlArguments>> {
    for param in params {
        query = match value::encode(param)? {
            NativeParam::Null => query.bind(None::<String>),
            NativeParam::Int(i) => query.bind(i),
            NativeParam::Double(d) => query.bind(d),
            NativeParam::Text(s) => query.bind(s),
            NativeParam::Bytes(b) => query.bind(b),
            NativeParam::Date(d) => query.bind(d),
            NativeParam::Time(t) => query.bind(t),
            NativeParam::DateTime(dt) => query.bind(dt),
        };
    }
    Ok(query)
}

fn decode_row(row: &MySqlRow) -> Result<Vec<PersistValue>> {
    row.columns()
        .iter()
        .map(|column| {
            let type_name = column.type_info().name();
            let native = NativeType::from_type_name(type_name)?;
            let unsigned = type_name.to_ascii_uppercase().contains("UNSIGNED");
            let raw = column_text(row, column.ordinal(), native, unsigned)?;
            value::decode(native, raw.as_deref())
        })
        .collect()
}

/// 按原生类型取出列值，并转换为与文本协议一致的字节形式
fn column_text(
    row: &MySqlRow,
    index: usize,
    native: NativeType,
    unsigned: bool,
) -> Result<Option<Vec<u8>>> {
    let raw = match native {
        NativeType::Tiny
        | NativeType::Short
        | NativeType::Int24
        | NativeType::Long
        | NativeType::LongLong
            if unsigned =>
        {
            row.try_get_unchecked::<Option<u64>, _>(index)?
                .map(|v| unsigned_to_i64(native, v))
                .transpose()?
                .map(|v| v.to_string().into_bytes())
        }
        NativeType::Tiny
        | NativeType::Short
        | NativeType::Int24
        | NativeType::Long
        | NativeType::LongLong
        | NativeType::Year => row
            .try_get_unchecked::<Option<i64>, _>(index)?
            .map(|v| v.to_string().into_bytes()),
        NativeType::Float => row
            .try_get_unchecked::<Option<f32>, _>(index)?
            .map(|v| v.to_string().into_bytes()),
        NativeType::Double => row
            .try_get_unchecked::<Option<f64>, _>(index)?
            .map(|v| v.to_string().into_bytes()),
        NativeType::Date | NativeType::NewDate => row
            .try_get_unchecked::<Option<NaiveDate>, _>(index)?
            .map(|v| v.format("%Y-%m-%d").to_string().into_bytes()),
        NativeType::Time => row
            .try_get_unchecked::<Option<NaiveTime>, _>(index)?
            .map(|v| v.format("%H:%M:%S%.f").to_string().into_bytes()),
        NativeType::DateTime | NativeType::Timestamp => row
            .try_get_unchecked::<Option<NaiveDateTime>, _>(index)?
            .map(|v| v.format("%Y-%m-%d %H:%M:%S%.f").to_string().into_bytes()),
        NativeType::Null => None,
        _ => row.try_get_unchecked::<Option<Vec<u8>>, _>(index)?,
    };
    Ok(raw)
}

/// 无符号整数超出 i64 范围时报错，不做回绕
fn unsigned_to_i64(native: NativeType, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        PersistError::marshal(format!("{native} UNSIGNED 列值 {value} 超出 Int64 范围"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_within_range() {
        assert_eq!(unsigned_to_i64(NativeType::Tiny, 255).unwrap(), 255);
        assert_eq!(
            unsigned_to_i64(NativeType::LongLong, i64::MAX as u64).unwrap(),
            i64::MAX
        );
    }

    #[test]
    fn test_unsigned_out_of_range() {
        let err = unsigned_to_i64(NativeType::LongLong, u64::MAX).unwrap_err();
        assert!(matches!(err, PersistError::Marshal(_)));
        assert!(err.to_string().contains(&u64::MAX.to_string()));
    }

    #[test]
    fn test_unsigned_tiny_decodes_without_wrapping() {
        let text = unsigned_to_i64(NativeType::Tiny, 255).unwrap().to_string();
        assert_eq!(
            value::decode(NativeType::Tiny, Some(text.as_bytes())).unwrap(),
            PersistValue::Bool(true)
        );
        let text = unsigned_to_i64(NativeType::Long, 4_000_000_000).unwrap().to_string();
        assert_eq!(
            value::decode(NativeType::Long, Some(text.as_bytes())).unwrap(),
            PersistValue::Int64(4_000_000_000)
        );
    }
}

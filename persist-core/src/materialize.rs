//! 将按列顺序读出的一行值还原为带主键的实体

use crate::error::{PersistError, Result};
use crate::model::EntityDef;
use crate::value::{FromPersistValue, PersistValue};

/// 可以从一行值（不含主键部分）构造的实体
pub trait PersistEntity: Sized {
    fn from_values(values: &[PersistValue]) -> Result<Self>;
}

/// 实体主键
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Simple(PersistValue),
    /// 按复合主键定义顺序排列的字段值
    Composite(Vec<PersistValue>),
}

/// 带主键的实体
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<T> {
    pub key: Key,
    pub value: T,
}

/// 按顺序读取字段值，供 `PersistEntity::from_values` 实现使用
pub struct ValueReader<'a> {
    values: &'a [PersistValue],
    position: usize,
}

impl<'a> ValueReader<'a> {
    pub fn new(values: &'a [PersistValue]) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// 读取下一个字段
    pub fn read<T: FromPersistValue>(&mut self) -> Result<T> {
        let value = self.values.get(self.position).ok_or_else(|| {
            PersistError::materialize(format!(
                "缺少第 {} 个字段，值列表: {:?}",
                self.position + 1,
                self.values
            ))
        })?;
        self.position += 1;
        T::from_persist_value(value)
    }

    /// 确认全部字段都已读取
    pub fn finish(self) -> Result<()> {
        if self.position == self.values.len() {
            Ok(())
        } else {
            Err(PersistError::materialize(format!(
                "多出 {} 个字段，值列表: {:?}",
                self.values.len() - self.position,
                self.values
            )))
        }
    }
}

/// 还原实体
///
/// 复合主键：主键取定义中列出的字段（按定义顺序），其余值按原顺序构成实体；
/// 简单主键：第一个值是主键，其余为实体。
pub fn materialize<T: PersistEntity>(
    def: &EntityDef,
    values: Vec<PersistValue>,
) -> Result<Entity<T>> {
    let (key, body) = match &def.primary_key {
        Some(composite) => {
            if values.len() != def.fields.len() {
                return Err(count_mismatch(def, def.fields.len(), &values));
            }
            let mut key_positions = Vec::with_capacity(composite.fields.len());
            for field_name in &composite.fields {
                let position = def
                    .fields
                    .iter()
                    .position(|f| f.name == *field_name)
                    .ok_or_else(|| {
                        PersistError::materialize(format!(
                            "复合主键字段 {field_name} 不在实体 {} 中，值列表: {values:?}",
                            def.name
                        ))
                    })?;
                key_positions.push(position);
            }

            let key = key_positions.iter().map(|&i| values[i].clone()).collect();
            let body: Vec<PersistValue> = values
                .iter()
                .enumerate()
                .filter(|(i, _)| !key_positions.contains(i))
                .map(|(_, v)| v.clone())
                .collect();
            (Key::Composite(key), body)
        }
        None => {
            if values.len() != def.fields.len() + 1 {
                return Err(count_mismatch(def, def.fields.len() + 1, &values));
            }
            let mut rest = values.clone();
            let key = rest.remove(0);
            if key.is_null() {
                return Err(PersistError::materialize(format!(
                    "实体 {} 的主键为空，值列表: {values:?}",
                    def.name
                )));
            }
            (Key::Simple(key), rest)
        }
    };

    let value = T::from_values(&body).map_err(|e| {
        PersistError::materialize(format!("实体 {} 构造失败: {e}，值列表: {values:?}", def.name))
    })?;
    Ok(Entity { key, value })
}

fn count_mismatch(def: &EntityDef, expected: usize, values: &[PersistValue]) -> PersistError {
    PersistError::materialize(format!(
        "实体 {} 需要 {expected} 个值，实际为 {}，值列表: {values:?}",
        def.name,
        values.len()
    ))
}

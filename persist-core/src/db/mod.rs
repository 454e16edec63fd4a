// MySQL 数据库模块
//
// 提供基于 sqlx 连接池的 QueryRunner 实现，供表结构读取和迁移执行使用。
// 查询参数通过值编解码模块转换为原生参数绑定，结果列按驱动报告的
// 原生类型解码为 PersistValue。

mod runner;

pub use runner::MySqlRunner;

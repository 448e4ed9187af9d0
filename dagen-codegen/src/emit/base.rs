//! Per-repository files that do not depend on any routine.

use crate::builder::CodeBuilder;

const TRANSACTION_RESULT: &str = "public enum TransactionResult
{
Rollback,
Commit
}";

fn transaction_context(repository: &str) -> String {
    CodeBuilder::csharp()
        .block("public class TransactionManagedContext", |b| {
            b.block(
                &format!(
                    "public TransactionManagedContext(I{repository} repository, SqlConnection? connection, SqlTransaction? transaction)"
                ),
                |b| {
                    b.line("Repository = repository;")
                        .line("Connection = connection;")
                        .line("Transaction = transaction;")
                },
            )
            .blank()
            .line(&format!("public I{repository} Repository {{ get; set; }}"))
            .line("public SqlConnection? Connection { get; set; }")
            .line("public SqlTransaction? Transaction { get; set; }")
        })
        .build()
}

const CONVERT_DB_NULL: &str = "private object? ConvertDBNullToNull(object item)
{
return item == DBNull.Value ? null : item;
}";

fn run_transaction(repository: &str) -> String {
    format!(
        "public async Task RunTransaction(Func<TransactionManagedContext, Task<TransactionResult>> action)
{{
using (SqlConnection connection = new SqlConnection(_connectionString))
{{
await connection.OpenAsync();
using (var transaction = connection.BeginTransaction())
{{
try
{{
_inTransaction = true;
var transactionManaged = new {repository}.TransactionManaged(connection, transaction);
var transactionContext = new TransactionManagedContext(transactionManaged, connection, transaction);
var result = await action.Invoke(transactionContext);
if (result == TransactionResult.Rollback)
{{
transaction.Rollback();
}}
else
{{
transaction.Commit();
}}
}}
catch
{{
transaction.Rollback();
_inTransaction = false;
throw;
}}
_inTransaction = false;
}}
}}
}}"
    )
}

fn transaction_managed(repository: &str) -> String {
    CodeBuilder::csharp()
        .block(
            &format!("public partial class TransactionManaged : I{repository}"),
            |b| {
                b.line("private SqlConnection connection;")
                    .line("private SqlTransaction transaction;")
                    .blank()
                    .block(
                        "public TransactionManaged(SqlConnection connectionParameter, SqlTransaction transactionParameter)",
                        |b| {
                            b.line("connection = connectionParameter;")
                                .line("transaction = transactionParameter;")
                        },
                    )
                    .blank()
                    .lines(CONVERT_DB_NULL)
                    .blank()
                    .block(
                        "public async Task RunTransaction(Func<TransactionManagedContext, Task<TransactionResult>> action)",
                        |b| b.line("await Task.Run(() => throw new NotImplementedException());"),
                    )
            },
        )
        .build()
}

/// Body of `{Repository}.generated.cs`: transaction plumbing and the connection string.
pub fn repository_base(repository: &str) -> String {
    CodeBuilder::csharp()
        .lines(TRANSACTION_RESULT)
        .blank()
        .block(&format!("public partial interface I{repository}"), |b| {
            b.line("Task RunTransaction(Func<TransactionManagedContext, Task<TransactionResult>> action);")
        })
        .blank()
        .lines(&transaction_context(repository))
        .blank()
        .block(
            &format!("public partial class {repository} : I{repository}"),
            |b| {
                b.line("protected bool _inTransaction = false;")
                    .line("private string _connectionString;")
                    .blank()
                    .block(&format!("public {repository}(string connectionString)"), |b| {
                        b.line("_connectionString = connectionString;")
                    })
                    .blank()
                    .lines(CONVERT_DB_NULL)
                    .blank()
                    .lines(&run_transaction(repository))
                    .blank()
                    .lines(&transaction_managed(repository))
            },
        )
        .build()
}

/// Body of `Fake/Fake{Repository}.generated.cs`.
pub fn fake_base(repository: &str) -> String {
    CodeBuilder::csharp()
        .block(
            &format!("public partial class Fake{repository} : I{repository}"),
            |b| {
                b.block(&format!("public Fake{repository}()"), |b| b)
                    .blank()
                    .block(
                        "public async Task RunTransaction(Func<TransactionManagedContext, Task<TransactionResult>> action)",
                        |b| {
                            b.line("// fakes have no connection to hand out")
                                .line("var context = new TransactionManagedContext(this, null, null);")
                                .line("await action.Invoke(context);")
                        },
                    )
            },
        )
        .build()
}

#[cfg(test)]
mod tests {
    use dagen_core::format::format;

    use super::*;

    #[test]
    fn test_repository_base_shape() {
        let text = format(&repository_base("ShopRepository"));
        assert!(text.starts_with("public enum TransactionResult\n{\n    Rollback,\n    Commit\n}"));
        assert!(text.contains("public partial interface IShopRepository\n{\n    Task RunTransaction("));
        assert!(text.contains("public partial class ShopRepository : IShopRepository"));
        assert!(text.contains("    public ShopRepository(string connectionString)"));
        assert!(text.contains("var transactionManaged = new ShopRepository.TransactionManaged(connection, transaction);"));
        assert!(text.contains("    public partial class TransactionManaged : IShopRepository"));
        assert!(text.contains("throw new NotImplementedException()"));
    }

    #[test]
    fn test_repository_base_braces_balance() {
        let text = repository_base("ShopRepository");
        assert_eq!(text.matches('{').count(), text.matches('}').count());
        assert!(format(&text).trim_end().ends_with("    }\n}"));
    }

    #[test]
    fn test_fake_base() {
        insta::assert_snapshot!(format(&fake_base("ShopRepository")), @r"
        public partial class FakeShopRepository : IShopRepository
        {
            public FakeShopRepository()
            {
            }

            public async Task RunTransaction(Func<TransactionManagedContext, Task<TransactionResult>> action)
            {
                // fakes have no connection to hand out
                var context = new TransactionManagedContext(this, null, null);
                await action.Invoke(context);
            }
        }
        ");
    }
}

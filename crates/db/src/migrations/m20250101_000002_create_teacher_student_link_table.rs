//! Create teacher-student link table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeacherStudentLink::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherStudentLink::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::TeacherId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::CreatedBy)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::UpdatedBy)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherStudentLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(TeacherStudentLink::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_link_student")
                            .from(TeacherStudentLink::Table, TeacherStudentLink::StudentId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_link_teacher")
                            .from(TeacherStudentLink::Table, TeacherStudentLink::TeacherId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (student_id, teacher_id) - reactivation reuses the row
        manager
            .create_index(
                Index::create()
                    .name("idx_link_student_teacher")
                    .table(TeacherStudentLink::Table)
                    .col(TeacherStudentLink::StudentId)
                    .col(TeacherStudentLink::TeacherId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: teacher_id (roster lookups and common-student grouping)
        manager
            .create_index(
                Index::create()
                    .name("idx_link_teacher_id")
                    .table(TeacherStudentLink::Table)
                    .col(TeacherStudentLink::TeacherId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeacherStudentLink::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TeacherStudentLink {
    Table,
    Id,
    StudentId,
    TeacherId,
    IsDeleted,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

use quarry::{
    Entity, Error, ErrorKind, Executor, Property, QueryExpression, Result, Session, ValueEnum,
    error_kind,
};
use time::{Date, macros::date};
use uuid::Uuid;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Day,
    Evening,
    #[quarry(name = "night")]
    Night,
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[quarry(name = "Employee", schema = "main", validate = Self::check)]
struct Employee {
    #[quarry(name = "BusinessEntityID", identifier)]
    id: i32,
    #[quarry(name = "LoginID", size = 256)]
    login: String,
    #[quarry(name = "HireDate")]
    hired: Date,
    #[quarry(name = "Shift")]
    shift: Shift,
    #[quarry(name = "rowguid")]
    guid: Uuid,
    #[quarry(name = "Photo")]
    photo: Option<Vec<u8>>,
    #[quarry(ignore)]
    session_notes: String,
}

impl Employee {
    fn check(&self) -> Result<()> {
        if !self.login.contains('\\') {
            return Err(Error::msg(format!(
                "Login `{}` must look like `domain\\user`",
                self.login
            )));
        }
        Ok(())
    }
}

pub async fn validation<X: Executor>(session: &mut Session<X>) {
    session
        .drop_table::<Employee>(true)
        .await
        .expect("Failed to drop the Employee table");
    session
        .create_table::<Employee>(false)
        .await
        .expect("Failed to create the Employee table");
    let mut employee = Employee {
        id: 1,
        login: "adventure-works\\ken0".into(),
        hired: date!(2009 - 01 - 14),
        shift: Shift::Night,
        guid: Uuid::parse_str("f01251e5-96a3-448d-981e-0f99d789110d").expect("Valid uuid"),
        photo: Some(vec![0xff, 0xd8, 0xff]),
        session_notes: "Not stored".into(),
    };
    session.insert(&mut employee).await.expect("Failed to insert");

    let stored = session
        .find::<Employee>(1)
        .await
        .expect("Find failed")
        .expect("The employee is stored");
    assert_eq!(stored.shift, Shift::Night);
    assert_eq!(stored.hired, employee.hired);
    assert_eq!(stored.guid, employee.guid);
    assert_eq!(stored.photo, employee.photo);
    assert_eq!(stored.session_notes, "");

    let query = QueryExpression::new()
        .from::<Employee>()
        .filter(Employee::shift.equal(Shift::Night))
        .build()
        .expect("Valid query");
    assert_eq!(
        session
            .select::<Employee>(&query)
            .await
            .expect("Select failed")
            .len(),
        1
    );

    // Nothing is written when validation fails
    let mut invalid = Employee {
        id: 2,
        login: "ken0".into(),
        shift: Shift::Day,
        ..employee.clone()
    };
    let error = session
        .insert(&mut invalid)
        .await
        .expect_err("The login is not valid");
    match error_kind(&error) {
        Some(ErrorKind::Validation { type_name, message }) => {
            assert_eq!(*type_name, "Employee");
            assert!(message.contains("ken0"));
        }
        other => panic!("Expected a validation error, got {other:?}"),
    }
    assert!(session.find::<Employee>(2).await.expect("Find failed").is_none());

    employee.login = "ken0".into();
    assert!(session.update(&mut employee).await.is_err());
    let stored = session
        .reload(&employee)
        .await
        .expect("Reload failed")
        .expect("The employee is stored");
    assert_eq!(stored.login, "adventure-works\\ken0");
}

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, i64 as parse_i64, multispace0},
    combinator::{all_consuming, map, opt, value, verify},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded, separated_pair},
    IResult, Parser as _,
};

use crate::error::PathParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Child(String),
    Index(i64),
    Union(Vec<i64>),
    Slice { start: Option<i64>, end: Option<i64> },
    Wildcard,
    Descendant(String),
    Filter(Filter),
}

impl Step {
    /// Whether the step selects at most one value.
    pub(crate) fn is_definite(&self) -> bool {
        matches!(self, Step::Child(_) | Step::Index(_))
    }
}

/// `[?(@.a.b OP literal)]`, or an existence test when `comparison` is absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Filter {
    pub(crate) field: Vec<String>,
    pub(crate) comparison: Option<(CmpOp, Literal)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

pub(crate) fn parse(query: &str) -> Result<Vec<Step>, PathParseError> {
    match all_consuming(path).parse(query) {
        Ok((_, steps)) => Ok(steps),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let offset = query.len() - e.input.len();
            let message = if offset == 0 {
                "path must start with '$'".to_string()
            } else {
                format!("unexpected {:?}", e.input)
            };
            Err(PathParseError { offset, message })
        }
        Err(nom::Err::Incomplete(_)) => Err(PathParseError {
            offset: query.len(),
            message: "unexpected end of path".to_string(),
        }),
    }
}

fn path(input: &str) -> IResult<&str, Vec<Step>> {
    preceded(char('$'), many0(step)).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((descendant, dot_step, bracket_step)).parse(input)
}

fn descendant(input: &str) -> IResult<&str, Step> {
    map(preceded(tag(".."), member_name), |name| {
        Step::Descendant(name.to_string())
    })
    .parse(input)
}

fn dot_step(input: &str) -> IResult<&str, Step> {
    preceded(
        char('.'),
        alt((
            value(Step::Wildcard, char('*')),
            map(member_name, |name| Step::Child(name.to_string())),
        )),
    )
    .parse(input)
}

fn bracket_step(input: &str) -> IResult<&str, Step> {
    delimited(
        char('['),
        alt((
            value(Step::Wildcard, char('*')),
            map(quoted, |name| Step::Child(name.to_string())),
            filter,
            slice,
            indices,
        )),
        char(']'),
    )
    .parse(input)
}

fn member_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse(input)
}

/// Single- or double-quoted string. Escapes are not supported.
fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_until("'"), char('\'')),
        delimited(char('"'), take_until("\""), char('"')),
    ))
    .parse(input)
}

fn slice(input: &str) -> IResult<&str, Step> {
    map(
        separated_pair(opt(parse_i64), char(':'), opt(parse_i64)),
        |(start, end)| Step::Slice { start, end },
    )
    .parse(input)
}

fn indices(input: &str) -> IResult<&str, Step> {
    map(separated_list1(char(','), parse_i64), |indices: Vec<i64>| {
        if indices.len() == 1 {
            Step::Index(indices[0])
        } else {
            Step::Union(indices)
        }
    })
    .parse(input)
}

fn filter(input: &str) -> IResult<&str, Step> {
    let field = preceded(
        char('@'),
        many0(preceded(char('.'), map(member_name, str::to_string))),
    );
    let comparison = opt((comparison_operator, multispace0, literal));

    map(
        delimited(
            (char('?'), char('('), multispace0),
            (field, multispace0, comparison),
            (multispace0, char(')')),
        ),
        |(field, _, comparison)| {
            Step::Filter(Filter {
                field,
                comparison: comparison.map(|(op, _, literal)| (op, literal)),
            })
        },
    )
    .parse(input)
}

fn comparison_operator(input: &str) -> IResult<&str, CmpOp> {
    alt((
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Lt, tag("<")),
        value(CmpOp::Gt, tag(">")),
    ))
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(quoted, |s| Literal::String(s.to_string())),
        value(Literal::Bool(true), tag("true")),
        value(Literal::Bool(false), tag("false")),
        value(Literal::Null, tag("null")),
        map(verify(double, |n: &f64| n.is_finite()), Literal::Number),
    ))
    .parse(input)
}
